use crate::foundation::core::{Rect, Size};

/// Largest rect with `image`'s aspect ratio that fits inside `target`, centered.
///
/// Wider images span the full width with bars above and below; taller images span the full
/// height with bars left and right. Degenerate inputs yield [`Rect::ZERO`].
pub fn fit_rect(image: Size, target: Size) -> Rect {
    if image.width <= 0.0 || image.height <= 0.0 || target.width <= 0.0 || target.height <= 0.0
    {
        return Rect::ZERO;
    }
    let img_ratio = image.width / image.height;
    let target_ratio = target.width / target.height;
    let (w, h) = if img_ratio > target_ratio {
        (target.width, target.width / img_ratio)
    } else {
        (target.height * img_ratio, target.height)
    };
    let x = (target.width - w) / 2.0;
    let y = (target.height - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// `true` when drawing `image` into `target` leaves letterbox bars.
pub fn has_bars(image: Size, target: Size) -> bool {
    let r = fit_rect(image, target);
    (r.width() - target.width).abs() > 1e-9 || (r.height() - target.height).abs() > 1e-9
}

//! Panel placement across displays. Everything here is in physical pixels
//! and nothing here can fail: non-finite input degrades to a centered panel.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    fn distance_to(&self, point: Point) -> f64 {
        let dx = (self.x - point.x).max(point.x - self.right()).max(0.0);
        let dy = (self.y - point.y).max(point.y - self.bottom()).max(0.0);
        dx.hypot(dy)
    }

    fn overlap_area(&self, other: &Rect) -> f64 {
        let w = self.right().min(other.right()) - self.x.max(other.x);
        let h = self.bottom().min(other.bottom()) - self.y.max(other.y);
        if w > 0.0 && h > 0.0 {
            w * h
        } else {
            0.0
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Display {
    /// Usable area: excludes taskbars, docks and menu bars.
    pub work_area: Rect,
    pub scale_factor: f64,
}

impl Display {
    /// Used when the platform reports no displays at all.
    pub fn fallback() -> Self {
        Self {
            work_area: Rect::new(0.0, 0.0, 1920.0, 1080.0),
            scale_factor: 1.0,
        }
    }

    pub fn scale(&self) -> f64 {
        if self.scale_factor.is_finite() && self.scale_factor > 0.0 {
            self.scale_factor
        } else {
            1.0
        }
    }
}

/// Display containing `point`, else the closest one. `None` only when
/// `displays` is empty.
pub fn display_nearest(displays: &[Display], point: Point) -> Option<Display> {
    displays
        .iter()
        .find(|d| d.work_area.contains(point))
        .or_else(|| {
            displays.iter().min_by(|a, b| {
                a.work_area
                    .distance_to(point)
                    .total_cmp(&b.work_area.distance_to(point))
            })
        })
        .copied()
}

/// Display sharing the largest area with `bounds`; falls back to the one
/// nearest its center.
pub fn display_overlapping(displays: &[Display], bounds: Rect) -> Option<Display> {
    let best = displays
        .iter()
        .map(|d| (d, d.work_area.overlap_area(&bounds)))
        .filter(|(_, area)| *area > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(d, _)| *d);

    best.or_else(|| display_nearest(displays, bounds.center()))
}

/// Top-left placement for a `width`×`height` panel centered on `display`.
pub fn centered_on(display: &Display, width: f64, height: f64) -> Rect {
    let area = if display.work_area.is_finite() {
        display.work_area
    } else {
        Display::fallback().work_area
    };
    let x = area.x + (area.width - width) / 2.0;
    let y = area.y + (area.height - height) / 2.0;
    let rect = Rect::new(x, y, width, height);
    if rect.is_finite() {
        clamp_to(rect, &area)
    } else {
        Rect::new(area.x, area.y, width, height)
    }
}

/// Keeps `rect` inside `area`. A panel larger than the area is pinned to the
/// area's top-left corner.
pub fn clamp_to(rect: Rect, area: &Rect) -> Rect {
    let max_x = (area.right() - rect.width).max(area.x);
    let max_y = (area.bottom() - rect.height).max(area.y);
    Rect::new(
        rect.x.clamp(area.x, max_x),
        rect.y.clamp(area.y, max_y),
        rect.width,
        rect.height,
    )
}

/// Panel centered on the pointer, clamped to the pointer's display.
pub fn place_near_pointer(display: &Display, pointer: Option<Point>, width: f64, height: f64) -> Rect {
    let Some(pointer) = pointer else {
        return centered_on(display, width, height);
    };

    let rect = Rect::new(pointer.x - width / 2.0, pointer.y - height / 2.0, width, height);
    if !rect.is_finite() || !display.work_area.is_finite() {
        return centered_on(display, width, height);
    }

    clamp_to(rect, &display.work_area)
}

/// `bounds` moved by (`dx`, `dy`) and clamped to `display`.
pub fn translate_within(bounds: Rect, dx: f64, dy: f64, display: &Display) -> Rect {
    let moved = Rect::new(bounds.x + dx, bounds.y + dy, bounds.width, bounds.height);
    if !moved.is_finite() || !display.work_area.is_finite() {
        return centered_on(display, bounds.width, bounds.height);
    }
    clamp_to(moved, &display.work_area)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(x: f64, y: f64, w: f64, h: f64) -> Display {
        Display {
            work_area: Rect::new(x, y, w, h),
            scale_factor: 1.0,
        }
    }

    fn inside(rect: &Rect, area: &Rect) -> bool {
        rect.x >= area.x && rect.y >= area.y && rect.right() <= area.right() && rect.bottom() <= area.bottom()
    }

    #[test]
    fn panel_stays_inside_work_area_for_any_pointer() {
        let screen = display(0.0, 25.0, 1920.0, 1055.0);
        let mut x = -500.0;
        while x <= 2500.0 {
            let mut y = -500.0;
            while y <= 1600.0 {
                let placed = place_near_pointer(&screen, Some(Point { x, y }), 640.0, 160.0);
                assert!(inside(&placed, &screen.work_area), "{placed:?} for ({x}, {y})");
                y += 97.0;
            }
            x += 113.0;
        }
    }

    #[test]
    fn pointer_in_middle_centers_panel_on_pointer() {
        let screen = display(0.0, 0.0, 1920.0, 1080.0);
        let placed = place_near_pointer(&screen, Some(Point { x: 900.0, y: 500.0 }), 640.0, 160.0);
        assert_eq!(placed, Rect::new(580.0, 420.0, 640.0, 160.0));
    }

    #[test]
    fn non_finite_pointer_falls_back_to_center() {
        let screen = display(0.0, 0.0, 1920.0, 1080.0);
        for pointer in [
            Point { x: f64::NAN, y: 10.0 },
            Point { x: 10.0, y: f64::INFINITY },
        ] {
            let placed = place_near_pointer(&screen, Some(pointer), 640.0, 160.0);
            assert_eq!(placed, Rect::new(640.0, 460.0, 640.0, 160.0));
        }
        assert_eq!(
            place_near_pointer(&screen, None, 640.0, 160.0),
            Rect::new(640.0, 460.0, 640.0, 160.0)
        );
    }

    #[test]
    fn non_finite_work_area_never_produces_nan() {
        let broken = display(f64::NAN, 0.0, 1920.0, 1080.0);
        let placed = place_near_pointer(&broken, Some(Point { x: 5.0, y: 5.0 }), 640.0, 160.0);
        assert_eq!(placed, Rect::new(640.0, 460.0, 640.0, 160.0));
    }

    #[test]
    fn nearest_display_prefers_containment_then_distance() {
        let left = display(0.0, 0.0, 1920.0, 1080.0);
        let right = display(1920.0, 0.0, 2560.0, 1440.0);
        let displays = [left, right];

        assert_eq!(display_nearest(&displays, Point { x: 2000.0, y: 100.0 }), Some(right));
        assert_eq!(display_nearest(&displays, Point { x: -50.0, y: 100.0 }), Some(left));
        assert_eq!(display_nearest(&displays, Point { x: 3000.0, y: 1400.0 }), Some(right));
        assert_eq!(display_nearest(&[], Point { x: 0.0, y: 0.0 }), None);
    }

    #[test]
    fn overlapping_display_follows_the_larger_share() {
        let left = display(0.0, 0.0, 1920.0, 1080.0);
        let right = display(1920.0, 0.0, 1920.0, 1080.0);
        let displays = [left, right];

        let mostly_right = Rect::new(1800.0, 100.0, 640.0, 160.0);
        assert_eq!(display_overlapping(&displays, mostly_right), Some(right));

        let mostly_left = Rect::new(1500.0, 100.0, 640.0, 160.0);
        assert_eq!(display_overlapping(&displays, mostly_left), Some(left));
    }

    #[test]
    fn nudge_right_at_edge_is_clamped() {
        let screen = display(0.0, 0.0, 1920.0, 1080.0);
        let at_edge = Rect::new(1280.0, 400.0, 640.0, 160.0);
        let nudged = translate_within(at_edge, 8.0, 0.0, &screen);
        assert_eq!(nudged.right(), 1920.0);
        assert_eq!(nudged.x, 1280.0);

        let near_edge = Rect::new(1276.0, 400.0, 640.0, 160.0);
        assert_eq!(translate_within(near_edge, 8.0, 0.0, &screen).x, 1280.0);
    }

    #[test]
    fn oversized_panel_is_pinned_to_origin() {
        let small = display(100.0, 50.0, 400.0, 100.0);
        let placed = place_near_pointer(&small, Some(Point { x: 300.0, y: 100.0 }), 640.0, 160.0);
        assert_eq!((placed.x, placed.y), (100.0, 50.0));
    }
}

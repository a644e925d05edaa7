use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub id: i64,
    pub x: f32,
    pub y: f32,
}

/// Canvas-space input, in pixels from the top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointerEvent {
    MouseMove { x: f32, y: f32 },
    MouseDown,
    MouseLeave,
    TouchStart { touches: Vec<Touch> },
    TouchMove { touches: Vec<Touch> },
    TouchEnd { touches: Vec<Touch> },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub id: Option<i64>,
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub down: bool,
    pub moved: bool,
    pub color: [f32; 3],
}

impl Default for Pointer {
    fn default() -> Self {
        Self {
            id: None,
            x: 0.0,
            y: 0.0,
            dx: 0.0,
            dy: 0.0,
            down: false,
            moved: false,
            color: [30.0, 0.0, 300.0],
        }
    }
}

impl Pointer {
    fn move_to(&mut self, x: f32, y: f32, delta_scale: f32) {
        self.moved = self.down;
        self.dx = (x - self.x) * delta_scale;
        self.dy = (y - self.y) * delta_scale;
        self.x = x;
        self.y = y;
    }
}

/// An impulse to inject this frame: canvas position, velocity and dye color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: [f32; 3],
}

/// Slot 0 is the mouse; touch `i` of the current touch list lives in slot `i + 1`.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    pointers: Vec<Pointer>,
    delta_scale: f32,
}

impl PointerTracker {
    pub fn new(delta_scale: f32) -> Self {
        Self {
            pointers: vec![Pointer::default()],
            delta_scale,
        }
    }

    pub fn pointers(&self) -> &[Pointer] {
        &self.pointers
    }

    pub fn handle(&mut self, event: &PointerEvent, rng: &mut impl Rng) {
        match event {
            PointerEvent::MouseMove { x, y } => {
                let mouse = &mut self.pointers[0];
                mouse.move_to(*x, *y, self.delta_scale);
                if mouse.down {
                    mouse.color = random_color(rng, 15.0, 0.2);
                }
            }
            PointerEvent::MouseDown => self.pointers[0].down = true,
            PointerEvent::MouseLeave => self.pointers[0].down = false,
            PointerEvent::TouchStart { touches } => {
                for (i, touch) in touches.iter().enumerate() {
                    let slot = i + 1;
                    if slot >= self.pointers.len() {
                        self.pointers.resize(slot + 1, Pointer::default());
                    }
                    let pointer = &mut self.pointers[slot];
                    pointer.id = Some(touch.id);
                    pointer.down = true;
                    pointer.x = touch.x;
                    pointer.y = touch.y;
                    pointer.color = random_color(rng, 10.0, 1.0);
                }
            }
            PointerEvent::TouchMove { touches } => {
                for (i, touch) in touches.iter().enumerate() {
                    if let Some(pointer) = self.pointers.get_mut(i + 1) {
                        pointer.move_to(touch.x, touch.y, self.delta_scale);
                    }
                }
            }
            PointerEvent::TouchEnd { touches } => {
                for touch in touches {
                    for pointer in self.pointers.iter_mut().skip(1) {
                        if pointer.id == Some(touch.id) {
                            pointer.down = false;
                        }
                    }
                }
            }
        }
    }

    /// Drains the pointers that moved since the last frame. A pointer whose
    /// delta is zero is cleared without producing a splat.
    pub fn take_splats(&mut self) -> Vec<Splat> {
        let mut splats = Vec::new();
        for pointer in &mut self.pointers {
            if !pointer.moved {
                continue;
            }
            pointer.moved = false;
            if pointer.dx == 0.0 && pointer.dy == 0.0 {
                continue;
            }
            splats.push(Splat {
                x: pointer.x,
                y: pointer.y,
                dx: pointer.dx,
                dy: pointer.dy,
                color: pointer.color,
            });
        }
        splats
    }
}

fn random_color(rng: &mut impl Rng, scale: f32, floor: f32) -> [f32; 3] {
    [
        rng.gen_range(0.0..scale) + floor,
        rng.gen_range(0.0..scale) + floor,
        rng.gen_range(0.0..scale) + floor,
    ]
}

/// Random splats spread over the canvas, like the effect's opening burst.
pub fn random_splats(rng: &mut impl Rng, count: u32, canvas: (u32, u32)) -> Vec<Splat> {
    let (w, h) = (canvas.0.max(1) as f32, canvas.1.max(1) as f32);
    (0..count)
        .map(|_| Splat {
            x: rng.gen_range(0.0..w),
            y: rng.gen_range(0.0..h),
            dx: rng.gen_range(-500.0..500.0),
            dy: rng.gen_range(-500.0..500.0),
            color: [rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0), rng.gen_range(0.0..10.0)],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn mouse_move_without_button_does_not_splat() {
        let mut rng = rng();
        let mut tracker = PointerTracker::new(10.0);
        tracker.handle(&PointerEvent::MouseMove { x: 20.0, y: 30.0 }, &mut rng);
        assert!(tracker.take_splats().is_empty());
    }

    #[test]
    fn drag_splats_scaled_delta_once() {
        let mut rng = rng();
        let mut tracker = PointerTracker::new(10.0);
        tracker.handle(&PointerEvent::MouseMove { x: 20.0, y: 30.0 }, &mut rng);
        tracker.handle(&PointerEvent::MouseDown, &mut rng);
        tracker.handle(&PointerEvent::MouseMove { x: 25.0, y: 28.0 }, &mut rng);

        let splats = tracker.take_splats();
        assert_eq!(splats.len(), 1);
        assert_eq!((splats[0].x, splats[0].y), (25.0, 28.0));
        assert_eq!((splats[0].dx, splats[0].dy), (50.0, -20.0));
        assert!(splats[0].color.iter().all(|c| (0.2..15.2).contains(c)));
        assert!(tracker.take_splats().is_empty());
    }

    #[test]
    fn zero_delta_injects_nothing_and_clears_moved() {
        let mut rng = rng();
        let mut tracker = PointerTracker::new(10.0);
        tracker.handle(&PointerEvent::MouseDown, &mut rng);
        tracker.handle(&PointerEvent::MouseMove { x: 0.0, y: 0.0 }, &mut rng);
        assert!(tracker.pointers()[0].moved);
        assert!(tracker.take_splats().is_empty());
        assert!(!tracker.pointers()[0].moved);
    }

    #[test]
    fn mouse_leave_stops_splatting() {
        let mut rng = rng();
        let mut tracker = PointerTracker::new(10.0);
        tracker.handle(&PointerEvent::MouseDown, &mut rng);
        tracker.handle(&PointerEvent::MouseLeave, &mut rng);
        tracker.handle(&PointerEvent::MouseMove { x: 5.0, y: 5.0 }, &mut rng);
        assert!(tracker.take_splats().is_empty());
    }

    #[test]
    fn touches_get_their_own_pointers_until_they_end() {
        let mut rng = rng();
        let mut tracker = PointerTracker::new(10.0);
        let start = vec![Touch { id: 11, x: 10.0, y: 10.0 }, Touch { id: 12, x: 50.0, y: 50.0 }];
        tracker.handle(&PointerEvent::TouchStart { touches: start }, &mut rng);
        assert_eq!(tracker.pointers().len(), 3);
        assert!(!tracker.pointers()[0].down);

        let moved = vec![Touch { id: 11, x: 12.0, y: 10.0 }, Touch { id: 12, x: 50.0, y: 47.0 }];
        tracker.handle(&PointerEvent::TouchMove { touches: moved }, &mut rng);
        let splats = tracker.take_splats();
        assert_eq!(splats.len(), 2);
        assert_eq!((splats[0].dx, splats[0].dy), (20.0, 0.0));
        assert_eq!((splats[1].dx, splats[1].dy), (0.0, -30.0));

        tracker.handle(&PointerEvent::TouchEnd { touches: vec![Touch { id: 12, x: 0.0, y: 0.0 }] }, &mut rng);
        assert!(tracker.pointers()[1].down);
        assert!(!tracker.pointers()[2].down);

        tracker.handle(&PointerEvent::TouchMove { touches: vec![Touch { id: 11, x: 13.0, y: 10.0 }, Touch { id: 12, x: 1.0, y: 1.0 }] }, &mut rng);
        assert_eq!(tracker.take_splats().len(), 1);
    }

    #[test]
    fn events_parse_from_tagged_json() {
        let ev: PointerEvent = serde_json::from_str(r#"{"kind":"mouse_move","x":1.5,"y":2}"#).unwrap();
        assert_eq!(ev, PointerEvent::MouseMove { x: 1.5, y: 2.0 });
        let ev: PointerEvent = serde_json::from_str(r#"{"kind":"touch_end","touches":[{"id":3,"x":0,"y":0}]}"#).unwrap();
        assert!(matches!(ev, PointerEvent::TouchEnd { .. }));
    }

    #[test]
    fn random_splats_stay_on_canvas() {
        let mut rng = rng();
        let splats = random_splats(&mut rng, 40, (320, 200));
        assert_eq!(splats.len(), 40);
        for s in splats {
            assert!((0.0..320.0).contains(&s.x) && (0.0..200.0).contains(&s.y));
            assert!(s.dx.abs() <= 500.0 && s.dy.abs() <= 500.0);
        }
    }
}

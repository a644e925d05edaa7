/// Axis-aligned box, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.right() && other.x < self.right() && self.y < other.bottom() && other.y < self.bottom()
    }
}

pub const WING_FRAMES: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Bird {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub velocity: f32,
    pub frame_index: usize,
    /// Reference frames since the wing last moved.
    wing_clock: f32,
    last_flap_ms: Option<f64>,
}

impl Bird {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            velocity: 0.0,
            frame_index: 0,
            wing_clock: 0.0,
            last_flap_ms: None,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb {
            x: self.x,
            y: self.y,
            w: self.width,
            h: self.height,
        }
    }

    pub fn center_y(&self) -> f32 {
        self.y + self.height * 0.5
    }

    /// Integrates `k` reference frames of gravity and damping, keeping the bird
    /// inside `[0, view_height]`.
    pub fn update(&mut self, k: f32, gravity: f32, damping: f32, view_height: f32) {
        self.velocity += gravity * k;
        self.y += self.velocity * k;
        self.velocity *= damping.powf(k);

        if self.y > view_height - self.height {
            self.y = view_height - self.height;
            self.velocity = 0.0;
        } else if self.y < 0.0 {
            self.y = 0.0;
            self.velocity = 0.0;
        }

        self.wing_clock += k;
        while self.wing_clock >= 2.0 {
            self.wing_clock -= 2.0;
            self.frame_index = (self.frame_index + 1) % WING_FRAMES;
        }
    }

    /// Adds `lift` to the velocity. Rapid flaps push the bird forward by
    /// `nudge`, slow ones let it drift back by the same amount.
    pub fn flap(&mut self, lift: f32, now_ms: f64, fast_ms: f64, slow_ms: f64, nudge: f32) {
        self.velocity += lift;
        if let Some(last) = self.last_flap_ms {
            let elapsed = now_ms - last;
            if elapsed < fast_ms {
                self.x += nudge;
            } else if elapsed > slow_ms {
                self.x -= nudge;
            }
        }
        self.last_flap_ms = Some(now_ms);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipe {
    pub x: f32,
    pub width: f32,
    pub top_height: f32,
    pub bottom_y: f32,
    pub speed: f32,
    pub scored: bool,
}

impl Pipe {
    pub fn new(x: f32, width: f32, top_height: f32, gap: f32, speed: f32) -> Self {
        Self {
            x,
            width,
            top_height,
            bottom_y: top_height + gap,
            speed,
            scored: false,
        }
    }

    pub fn update(&mut self, k: f32) {
        self.x -= self.speed * k;
    }

    pub fn gap_center(&self) -> f32 {
        (self.top_height + self.bottom_y) * 0.5
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// True once the pipe has fully left the view on the left.
    pub fn is_off_screen(&self) -> bool {
        self.right() < 0.0
    }

    pub fn passed_by(&self, bird: &Bird) -> bool {
        bird.x > self.right()
    }

    pub fn top_rect(&self) -> Aabb {
        Aabb {
            x: self.x,
            y: 0.0,
            w: self.width,
            h: self.top_height.max(0.0),
        }
    }

    /// Bottom segment, reaching down to `floor_y`.
    pub fn bottom_rect(&self, floor_y: f32) -> Aabb {
        Aabb {
            x: self.x,
            y: self.bottom_y,
            w: self.width,
            h: (floor_y - self.bottom_y).max(0.0),
        }
    }

    pub fn collides(&self, bird: &Bird, floor_y: f32) -> bool {
        let body = bird.bounds();
        body.overlaps(&self.top_rect()) || body.overlaps(&self.bottom_rect(floor_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aabb_overlap_excludes_touching_edges() {
        let a = Aabb { x: 0.0, y: 0.0, w: 10.0, h: 10.0 };
        assert!(a.overlaps(&Aabb { x: 9.0, y: 9.0, w: 5.0, h: 5.0 }));
        assert!(!a.overlaps(&Aabb { x: 10.0, y: 0.0, w: 5.0, h: 5.0 }));
        assert!(!a.overlaps(&Aabb { x: 0.0, y: -5.0, w: 5.0, h: 5.0 }));
    }

    #[test]
    fn bird_falls_and_rests_on_the_floor() {
        let mut bird = Bird::new(50.0, 100.0, 40.0, 30.0);
        bird.update(1.0, 0.6, 0.9, 600.0);
        assert!((bird.velocity - 0.54).abs() < 1e-6);
        assert!((bird.y - 100.6).abs() < 1e-4);
        for _ in 0..1000 {
            bird.update(1.0, 0.6, 0.9, 600.0);
        }
        assert_eq!(bird.y, 570.0);
    }

    #[test]
    fn wing_cycles_every_two_updates() {
        let mut bird = Bird::new(0.0, 0.0, 1.0, 1.0);
        let frames: Vec<usize> = (0..6)
            .map(|_| {
                bird.update(1.0, 0.0, 1.0, 100.0);
                bird.frame_index
            })
            .collect();
        assert_eq!(frames, vec![0, 1, 1, 2, 2, 0]);
    }

    #[test]
    fn wing_cadence_follows_elapsed_time() {
        let mut smooth = Bird::new(0.0, 0.0, 1.0, 1.0);
        let mut choppy = Bird::new(0.0, 0.0, 1.0, 1.0);
        for _ in 0..10 {
            smooth.update(1.0, 0.0, 1.0, 100.0);
        }
        for _ in 0..5 {
            choppy.update(2.0, 0.0, 1.0, 100.0);
        }
        assert_eq!(smooth.frame_index, 2);
        assert_eq!(choppy.frame_index, smooth.frame_index);

        let mut stalled = Bird::new(0.0, 0.0, 1.0, 1.0);
        stalled.update(6.0, 0.0, 1.0, 100.0);
        assert_eq!(stalled.frame_index, 0);
    }

    #[test]
    fn flap_cadence_nudges_horizontally() {
        let mut bird = Bird::new(50.0, 100.0, 40.0, 30.0);
        bird.flap(-15.0, 0.0, 400.0, 800.0, 5.0);
        assert_eq!(bird.x, 50.0);
        assert_eq!(bird.velocity, -15.0);
        bird.flap(-15.0, 200.0, 400.0, 800.0, 5.0);
        assert_eq!(bird.x, 55.0);
        bird.flap(-15.0, 800.0, 400.0, 800.0, 5.0);
        assert_eq!(bird.x, 55.0);
        bird.flap(-15.0, 2000.0, 400.0, 800.0, 5.0);
        assert_eq!(bird.x, 50.0);
    }

    #[test]
    fn pipe_collision_uses_both_segments() {
        let pipe = Pipe::new(100.0, 52.0, 200.0, 150.0, 2.0);
        let mut bird = Bird::new(110.0, 250.0, 40.0, 30.0);
        assert!(!pipe.collides(&bird, 600.0));
        bird.y = 190.0;
        assert!(pipe.collides(&bird, 600.0));
        bird.y = 330.0;
        assert!(pipe.collides(&bird, 600.0));
        bird.y = 190.0;
        bird.x = 10.0;
        assert!(!pipe.collides(&bird, 600.0));
        assert_eq!(pipe.gap_center(), 275.0);
        assert_eq!(pipe.top_rect().h, 200.0);
        assert_eq!(pipe.bottom_rect(600.0).h, 250.0);
    }
}

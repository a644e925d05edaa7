use std::path::Path;

use image::{Rgba, RgbaImage};

use super::entities::{Aabb, WING_FRAMES};
use super::world::{Status, World};
use crate::error::DemoResult;

const SKY: Rgba<u8> = Rgba([112, 197, 206, 255]);
const SKYLINE: Rgba<u8> = Rgba([160, 216, 190, 255]);
const PIPE: Rgba<u8> = Rgba([115, 191, 46, 255]);
const PIPE_RIM: Rgba<u8> = Rgba([84, 140, 34, 255]);
const GROUND: Rgba<u8> = Rgba([222, 216, 149, 255]);
const GROUND_STRIPE: Rgba<u8> = Rgba([205, 196, 120, 255]);
const BIRD: Rgba<u8> = Rgba([250, 200, 40, 255]);
const WING: Rgba<u8> = Rgba([230, 120, 30, 255]);

const STRIPE: f32 = 24.0;

fn fill(img: &mut RgbaImage, rect: Aabb, color: Rgba<u8>) {
    let (w, h) = (img.width() as f32, img.height() as f32);
    let x0 = rect.x.max(0.0).floor() as u32;
    let y0 = rect.y.max(0.0).floor() as u32;
    let x1 = rect.right().min(w).ceil().max(0.0) as u32;
    let y1 = rect.bottom().min(h).ceil().max(0.0) as u32;
    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, color);
        }
    }
}

/// Draws the current frame: sky, scrolling skyline, pipes, ground, bird and,
/// after game over, a darkening tint.
pub fn rasterize(world: &World) -> RgbaImage {
    let (width, height) = world.size();
    let mut img = RgbaImage::from_pixel(width as u32, height as u32, SKY);
    let ground_y = world.ground_y();

    // Skyline blocks repeat every quarter of the view and scroll slowly.
    let block = width * 0.25;
    let mut x = -world.background_offset() % block;
    let mut i = 0u32;
    while x < width {
        let h = block * (0.4 + 0.2 * (i % 3) as f32);
        fill(&mut img, Aabb { x, y: ground_y - h, w: block * 0.8, h }, SKYLINE);
        x += block;
        i += 1;
    }

    for pipe in world.pipes() {
        let top = pipe.top_rect();
        let bottom = pipe.bottom_rect(ground_y);
        fill(&mut img, top, PIPE);
        fill(&mut img, bottom, PIPE);
        let rim = 12.0f32.min(pipe.width * 0.25);
        fill(&mut img, Aabb { y: top.bottom() - rim, h: rim, ..top }, PIPE_RIM);
        fill(&mut img, Aabb { h: rim, ..bottom }, PIPE_RIM);
    }

    fill(&mut img, Aabb { x: 0.0, y: ground_y, w: width, h: height - ground_y }, GROUND);
    let mut x = -world.ground_offset() % (STRIPE * 2.0);
    while x < width {
        fill(&mut img, Aabb { x, y: ground_y, w: STRIPE, h: (height - ground_y).min(8.0) }, GROUND_STRIPE);
        x += STRIPE * 2.0;
    }

    let bird = world.bird();
    let body = bird.bounds();
    fill(&mut img, body, BIRD);
    // Wing up, level, down.
    let lift = (bird.frame_index % WING_FRAMES) as f32 - 1.0;
    let wing = Aabb {
        x: body.x + body.w * 0.15,
        y: body.y + body.h * 0.4 + lift * body.h * 0.2,
        w: body.w * 0.45,
        h: body.h * 0.25,
    };
    fill(&mut img, wing, WING);

    if world.status() == Status::GameOver {
        for pixel in img.pixels_mut() {
            for c in &mut pixel.0[..3] {
                *c /= 2;
            }
        }
    }
    img
}

pub fn save_snapshot(world: &World, path: impl AsRef<Path>) -> DemoResult<()> {
    rasterize(world).save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arcade::config::ArcadeConfig;
    use crate::arcade::entities::Pipe;

    #[test]
    fn frame_shows_bird_pipe_and_ground() {
        let mut world = World::new(ArcadeConfig::default(), 400.0, 600.0);
        world.push_pipe(Pipe::new(200.0, 52.0, 150.0, 150.0, 2.0));
        let img = rasterize(&world);
        assert_eq!(img.dimensions(), (400, 600));
        assert_eq!(*img.get_pixel(5, 5), SKY);
        assert_eq!(*img.get_pixel(225, 50), PIPE);
        assert_eq!(*img.get_pixel(225, 400), PIPE);
        assert_eq!(*img.get_pixel(225, 220), SKY);
        assert_eq!(*img.get_pixel(200, 590), GROUND);
        assert_eq!(*img.get_pixel(52, 287), BIRD);
    }

    #[test]
    fn game_over_darkens_the_frame() {
        let mut world = World::new(ArcadeConfig::default(), 400.0, 600.0);
        world.push_pipe(Pipe::new(60.0, 52.0, 300.0, 150.0, 2.0));
        world.step(1.0 / 60.0);
        assert_eq!(world.status(), Status::GameOver);
        let img = rasterize(&world);
        assert_eq!(img.get_pixel(5, 5).0, [56, 98, 103, 255]);
    }

    #[test]
    fn rects_outside_the_image_are_clipped() {
        let mut img = RgbaImage::from_pixel(4, 4, SKY);
        fill(&mut img, Aabb { x: -10.0, y: -10.0, w: 12.0, h: 12.0 }, PIPE);
        fill(&mut img, Aabb { x: 10.0, y: 10.0, w: 5.0, h: 5.0 }, PIPE);
        assert_eq!(*img.get_pixel(1, 1), PIPE);
        assert_eq!(*img.get_pixel(2, 2), SKY);
    }
}

use super::world::{Status, World};

/// Flaps when the bird's center sinks below the next gap's center (or the
/// middle of the sky when no pipe is ahead) and it is not already rising.
pub fn wants_flap(world: &World) -> bool {
    if world.status() != Status::Playing {
        return false;
    }
    let bird = world.bird();
    let target = world
        .next_pipe()
        .map(|pipe| pipe.gap_center())
        .unwrap_or(world.ground_y() * 0.5);
    bird.center_y() > target && bird.velocity >= 0.0
}

use fluid_arcade::gpu::Gpu;

/// Headless device for GPU-backed tests. `None` when the machine has no
/// usable adapter; callers skip in that case.
pub fn try_gpu() -> Option<Gpu> {
    let _ = env_logger::builder().is_test(true).try_init();
    match pollster::block_on(Gpu::new()) {
        Ok(gpu) => Some(gpu),
        Err(err) => {
            eprintln!("Skipping GPU test: {err}");
            None
        }
    }
}

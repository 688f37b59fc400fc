use std::{thread, time::Duration};

use eagle::{Detector, VideoDevice};
use kestrel::{CameraConfig, CameraHandle};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => CameraConfig::from_path(path)?,
        None => CameraConfig::default(),
    };
    let device = VideoDevice::new(config.id);
    let detector = Detector::new()?;

    #[cfg(feature = "vis")]
    let camera = {
        let rec = rerun::RecordingStreamBuilder::new("eagle").spawn()?;
        CameraHandle::with_visualizer(
            &config,
            device,
            detector,
            eagle::RerunVisualizer::new(rec, format!("camera{}", config.id)),
        )?
    };
    #[cfg(not(feature = "vis"))]
    let camera = CameraHandle::new(&config, device, detector)?;

    camera.start()?;

    let mut last_tag = camera.current_tag();
    loop {
        let snapshot = camera.snapshot();
        if snapshot.tag != last_tag {
            last_tag = snapshot.tag;
            for marker in &snapshot.markers {
                println!(
                    "[{}] marker {}: ({:.3}, {:.3}) heading {:.1}°",
                    snapshot.tag,
                    marker.id,
                    marker.world.center.x,
                    marker.world.center.y,
                    marker.world.heading.to_degrees()
                );
            }
        }
        thread::sleep(Duration::from_millis(50));
    }
}

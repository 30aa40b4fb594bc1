extern crate camctl;

use camctl::{CameraControl, CommandBackend};

fn main() {
    let mut camera = CameraControl::new(CommandBackend::new("/dev/video0")).unwrap();

    let old = camera.get_value("brightness").unwrap();

    println!("Current value of brightness: {}", old);
    camera.set_value("brightness", 5).unwrap();
    println!("New value of brightness: {}", camera.get_value("brightness").unwrap());

    camera.set_value("brightness", old).unwrap();
    println!("Restoring old value: {}", camera.get_value("brightness").unwrap());
}

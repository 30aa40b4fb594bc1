extern crate camctl;

use camctl::{Backend, CommandBackend, CtrlType};

fn main() {
    let mut backend = CommandBackend::new("/dev/video0");

    for (name, ctrl) in &backend.list().unwrap() {
        print!("{:>32} ", name);

        match ctrl.kind {
            CtrlType::Boolean => println!(
                "(bool)    default={:?} value={:?}",
                ctrl.default, ctrl.value
            ),
            CtrlType::Menu | CtrlType::IntegerMenu => {
                println!("({})  default={:?} value={:?}", ctrl.kind, ctrl.default, ctrl.value);
                for item in &ctrl.items {
                    println!("{:42} {}: {}", "", item.index, item.name);
                }
            }
            CtrlType::Button => println!("(button)"),
            _ => println!(
                "({:<7}) min={:?} max={:?} step={:?} default={:?} value={:?} {}",
                ctrl.kind, ctrl.min, ctrl.max, ctrl.step, ctrl.default, ctrl.value, ctrl.flags
            ),
        }
    }
}

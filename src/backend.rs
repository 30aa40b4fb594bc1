//! Access to the device: either through `v4l2-ctl` or straight through ioctls.

use std::ffi::OsString;
use std::os::unix::io::RawFd;
use std::process::Command;

use tracing::debug;

use crate::control::{Control, Controls, CtrlType, Flags, MenuItem};
use crate::parse::{normalize_name, parse_list, parse_value};
use crate::{v4l2, Error, Result};

/// Source of control descriptions and values.
pub trait Backend {
    /// List all controls with their current values.
    fn list(&mut self) -> Result<Controls>;

    /// Read the current value of one control.
    fn get(&mut self, name: &str) -> Result<i64>;

    /// Write one control.
    fn set(&mut self, name: &str, value: i64) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn list(&mut self) -> Result<Controls> {
        (**self).list()
    }

    fn get(&mut self, name: &str) -> Result<i64> {
        (**self).get(name)
    }

    fn set(&mut self, name: &str, value: i64) -> Result<()> {
        (**self).set(name, value)
    }
}

pub const DEFAULT_PROGRAM: &str = "v4l2-ctl";

/// Runs `v4l2-ctl`.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    program: OsString,
    device: Option<String>,
}

impl CommandBackend {
    /// An empty device path leaves the choice of device to `v4l2-ctl`.
    pub fn new(device: &str) -> CommandBackend {
        CommandBackend {
            program: DEFAULT_PROGRAM.into(),
            device: Some(device.to_owned()).filter(|d| !d.is_empty()),
        }
    }

    pub fn with_program<P: Into<OsString>>(mut self, program: P) -> CommandBackend {
        self.program = program.into();
        self
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    /// Arguments for one invocation, device selection first.
    pub fn args(&self, args: &[&str]) -> Vec<String> {
        let mut all = vec![];
        if let Some(ref device) = self.device {
            all.push("-d".to_owned());
            all.push(device.clone());
        }
        all.extend(args.iter().map(|s| s.to_string()));
        all
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        let args = self.args(args);
        debug!("running {:?} {:?}", self.program, args);

        let output = Command::new(&self.program).args(&args).output()?;

        if !output.status.success() {
            return Err(Error::Command {
                program: self.program.to_string_lossy().into_owned(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Backend for CommandBackend {
    fn list(&mut self) -> Result<Controls> {
        let out = self.run(&["--list-ctrls-menus"])?;
        Ok(parse_list(&out))
    }

    fn get(&mut self, name: &str) -> Result<i64> {
        let out = self.run(&["--get-ctrl", name])?;
        parse_value(&out)
    }

    fn set(&mut self, name: &str, value: i64) -> Result<()> {
        self.run(&["--set-ctrl", &format!("{}={}", name, value)])?;
        Ok(())
    }
}

pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Talks to the device node with `VIDIOC_*` ioctls.
pub struct NativeBackend {
    fd: RawFd,
    ids: Vec<(String, u32)>,
}

impl NativeBackend {
    pub fn new(device: &str) -> Result<NativeBackend> {
        let device = if device.is_empty() { DEFAULT_DEVICE } else { device };

        Ok(NativeBackend {
            fd: v4l2::open(device)?,
            ids: vec![],
        })
    }

    fn id(&mut self, name: &str) -> Result<u32> {
        if self.ids.is_empty() {
            self.list()?;
        }

        self.ids
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, id)| id)
            .ok_or_else(|| Error::UnknownControl(name.to_owned()))
    }

    fn query(&self, qctrl: &v4l2::QueryCtrl) -> Result<Control> {
        let kind = match qctrl.qtype {
            v4l2::CTRL_TYPE_INTEGER => CtrlType::Integer,
            v4l2::CTRL_TYPE_BOOLEAN => CtrlType::Boolean,
            v4l2::CTRL_TYPE_MENU => CtrlType::Menu,
            v4l2::CTRL_TYPE_INTEGER_MENU => CtrlType::IntegerMenu,
            v4l2::CTRL_TYPE_INTEGER64 => CtrlType::Integer64,
            v4l2::CTRL_TYPE_BITMASK => CtrlType::Bitmask,
            v4l2::CTRL_TYPE_BUTTON => CtrlType::Button,
            v4l2::CTRL_TYPE_STRING => CtrlType::String,
            _ => CtrlType::Unknown,
        };

        let mut ctrl = Control::new(kind);
        ctrl.flags = Flags::new(
            v4l2::CTRL_FLAG_NAMES
                .iter()
                .filter(|&&(bit, _)| qctrl.flags & bit != 0)
                .map(|&(_, word)| word),
        );

        match kind {
            CtrlType::Button | CtrlType::String | CtrlType::Unknown => return Ok(ctrl),
            CtrlType::Boolean => {}
            _ => {
                ctrl.min = Some(qctrl.minimum as i64);
                ctrl.max = Some(qctrl.maximum as i64);
            }
        }

        if matches!(kind, CtrlType::Integer | CtrlType::Integer64) {
            ctrl.step = Some(qctrl.step as i64);
        }
        ctrl.default = Some(qctrl.default_value as i64);

        // Write-only controls cannot be read back.
        if qctrl.flags & v4l2::CTRL_FLAG_WRITE_ONLY == 0 {
            let mut value = v4l2::Control::new(qctrl.id);
            match v4l2::xioctl(self.fd, v4l2::VIDIOC_G_CTRL, &mut value) {
                Ok(()) => ctrl.value = Some(value.value as i64),
                Err(err) => debug!("cannot read control {:#x}: {}", qctrl.id, err),
            }
        }

        if ctrl.kind == CtrlType::Menu || ctrl.kind == CtrlType::IntegerMenu {
            for index in qctrl.minimum..=qctrl.maximum {
                let mut qmenu = v4l2::QueryMenu::new(qctrl.id, index as u32);
                if v4l2::xioctl_valid(self.fd, v4l2::VIDIOC_QUERYMENU, &mut qmenu)? {
                    let name = if kind == CtrlType::IntegerMenu {
                        qmenu.value().to_string()
                    } else {
                        let name = qmenu.name;
                        buffer_to_string(&name)
                    };
                    ctrl.items.push(MenuItem {
                        index: index as i64,
                        name,
                    });
                }
            }
        }

        Ok(ctrl)
    }
}

impl Backend for NativeBackend {
    fn list(&mut self) -> Result<Controls> {
        let mut controls = Controls::new();
        let mut ids = vec![];
        let mut qctrl = v4l2::QueryCtrl::new(v4l2::CTRL_FLAG_NEXT_CTRL);

        while v4l2::xioctl_valid(self.fd, v4l2::VIDIOC_QUERYCTRL, &mut qctrl)? {
            let id = qctrl.id;

            if qctrl.flags & v4l2::CTRL_FLAG_DISABLED == 0
                && qctrl.qtype != v4l2::CTRL_TYPE_CTRL_CLASS
            {
                let name = normalize_name(&buffer_to_string(&qctrl.name));
                controls.insert(name.clone(), self.query(&qctrl)?);
                ids.push((name, id));
            }

            qctrl = v4l2::QueryCtrl::new(id | v4l2::CTRL_FLAG_NEXT_CTRL);
        }

        self.ids = ids;
        Ok(controls)
    }

    fn get(&mut self, name: &str) -> Result<i64> {
        let mut ctrl = v4l2::Control::new(self.id(name)?);
        v4l2::xioctl(self.fd, v4l2::VIDIOC_G_CTRL, &mut ctrl)?;
        Ok(ctrl.value as i64)
    }

    fn set(&mut self, name: &str, value: i64) -> Result<()> {
        let mut ctrl = v4l2::Control::new(self.id(name)?);
        ctrl.value = control_value(name, value)?;
        v4l2::xioctl(self.fd, v4l2::VIDIOC_S_CTRL, &mut ctrl)?;
        Ok(())
    }
}

impl Drop for NativeBackend {
    fn drop(&mut self) {
        let _ = v4l2::close(self.fd);
    }
}

/// `VIDIOC_S_CTRL` carries 32 bits.
fn control_value(name: &str, value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::OutOfRange {
        name: name.to_owned(),
        value,
    })
}

fn buffer_to_string(buf: &[u8]) -> String {
    String::from_utf8_lossy(match buf.iter().position(|&c| c == 0) {
        Some(x) => &buf[..x],
        None => buf,
    })
    .into_owned()
}

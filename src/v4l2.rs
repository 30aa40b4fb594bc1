use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;

use libc::{c_int, c_ulong, c_void, EINTR, O_RDWR};

pub fn open(file: &str) -> io::Result<RawFd> {
    let c_str = CString::new(file).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let fd = unsafe { libc::open(c_str.as_ptr(), O_RDWR, 0) };

    if fd == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(fd)
}

pub fn close(fd: RawFd) -> io::Result<()> {
    if unsafe { libc::close(fd) } == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

pub fn xioctl<T>(fd: RawFd, request: c_ulong, arg: &mut T) -> io::Result<()> {
    let argp: *mut T = arg;

    loop {
        let ret = unsafe { libc::ioctl(fd as c_int, request as _, argp as *mut c_void) };

        if ret != -1 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(EINTR) {
            return Err(err);
        }
    }
}

/// Like `xioctl`, but `EINVAL` (end of enumeration, unknown id) is `Ok(false)`.
pub fn xioctl_valid<T>(fd: RawFd, request: c_ulong, arg: &mut T) -> io::Result<bool> {
    match xioctl(fd, request, arg) {
        Err(ref err) if err.kind() == io::ErrorKind::InvalidInput => Ok(false),
        Err(err) => Err(err),
        Ok(_) => Ok(true),
    }
}

#[repr(C)]
pub struct QueryCtrl {
    pub id: u32,
    pub qtype: u32,
    pub name: [u8; 32],
    pub minimum: i32,
    pub maximum: i32,
    pub step: i32,
    pub default_value: i32,
    pub flags: u32,
    reserved: [u32; 2],
}

impl QueryCtrl {
    pub fn new(id: u32) -> QueryCtrl {
        QueryCtrl {
            id,
            qtype: 0,
            name: [0; 32],
            minimum: 0,
            maximum: 0,
            step: 0,
            default_value: 0,
            flags: 0,
            reserved: [0; 2],
        }
    }
}

#[repr(C, packed)]
pub struct QueryMenu {
    pub id: u32,
    pub index: u32,
    /// Either a name or, for integer menus, an `i64` value.
    pub name: [u8; 32],
    reserved: u32,
}

impl QueryMenu {
    pub fn new(id: u32, index: u32) -> QueryMenu {
        QueryMenu {
            id,
            index,
            name: [0; 32],
            reserved: 0,
        }
    }

    pub fn value(&self) -> i64 {
        let name = self.name;
        let mut bytes = [0; 8];
        bytes.copy_from_slice(&name[..8]);
        i64::from_ne_bytes(bytes)
    }
}

#[repr(C)]
pub struct Control {
    pub id: u32,
    pub value: i32,
}

impl Control {
    pub fn new(id: u32) -> Control {
        Control { id, value: 0 }
    }
}

pub const CTRL_TYPE_INTEGER: u32 = 1;
pub const CTRL_TYPE_BOOLEAN: u32 = 2;
pub const CTRL_TYPE_MENU: u32 = 3;
pub const CTRL_TYPE_BUTTON: u32 = 4;
pub const CTRL_TYPE_INTEGER64: u32 = 5;
pub const CTRL_TYPE_CTRL_CLASS: u32 = 6;
pub const CTRL_TYPE_STRING: u32 = 7;
pub const CTRL_TYPE_BITMASK: u32 = 8;
pub const CTRL_TYPE_INTEGER_MENU: u32 = 9;

pub const CTRL_FLAG_DISABLED: u32 = 0x0001;
pub const CTRL_FLAG_GRABBED: u32 = 0x0002;
pub const CTRL_FLAG_READ_ONLY: u32 = 0x0004;
pub const CTRL_FLAG_UPDATE: u32 = 0x0008;
pub const CTRL_FLAG_INACTIVE: u32 = 0x0010;
pub const CTRL_FLAG_SLIDER: u32 = 0x0020;
pub const CTRL_FLAG_WRITE_ONLY: u32 = 0x0040;
pub const CTRL_FLAG_VOLATILE: u32 = 0x0080;
pub const CTRL_FLAG_EXECUTE_ON_WRITE: u32 = 0x0200;
pub const CTRL_FLAG_NEXT_CTRL: u32 = 0x8000_0000;

/// Flag bits with the words `v4l2-ctl` prints for them.
pub const CTRL_FLAG_NAMES: [(u32, &str); 9] = [
    (CTRL_FLAG_DISABLED, "disabled"),
    (CTRL_FLAG_GRABBED, "grabbed"),
    (CTRL_FLAG_READ_ONLY, "read-only"),
    (CTRL_FLAG_UPDATE, "update"),
    (CTRL_FLAG_INACTIVE, "inactive"),
    (CTRL_FLAG_SLIDER, "slider"),
    (CTRL_FLAG_WRITE_ONLY, "write-only"),
    (CTRL_FLAG_VOLATILE, "volatile"),
    (CTRL_FLAG_EXECUTE_ON_WRITE, "execute-on-write"),
];

// IOCTL codes.
pub const VIDIOC_G_CTRL: c_ulong = 0xC008_561B;
pub const VIDIOC_S_CTRL: c_ulong = 0xC008_561C;
pub const VIDIOC_QUERYCTRL: c_ulong = 0xC044_5624;
pub const VIDIOC_QUERYMENU: c_ulong = 0xC02C_5625;

#[test]
fn test_sizes() {
    use std::mem;

    assert_eq!(mem::size_of::<QueryCtrl>(), 68);
    assert_eq!(mem::size_of::<QueryMenu>(), 44);
    assert_eq!(mem::size_of::<Control>(), 8);
}

#[test]
fn test_menu_value() {
    let mut qmenu = QueryMenu::new(1, 0);
    let mut name = [0; 32];
    name[..8].copy_from_slice(&1_000_000i64.to_ne_bytes());
    qmenu.name = name;
    assert_eq!(qmenu.value(), 1_000_000);
}

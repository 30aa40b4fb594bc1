//! Parsing of `v4l2-ctl` output.
//!
//! A listing (`--list-ctrls-menus`) looks like:
//!
//! ```text
//! User Controls
//!
//!                      brightness 0x00980900 (int)    : min=-64 max=64 step=1 default=0 value=0
//!            power_line_frequency 0x00980918 (menu)   : min=0 max=2 default=1 value=1 (50 Hz)
//!                                 0: Disabled
//!                                 1: 50 Hz
//!       white_balance_temperature 0x0098091a (int)    : min=2800 max=6500 step=1 default=4600 value=4600 flags=inactive
//! ```

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::control::{Control, Controls, CtrlType, Flags, MenuItem};
use crate::{Error, Result};

fn re_ctrl() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\w+)\b.*?\(([a-z0-9]+)\)\s*:\s?(.*)$").unwrap())
}

fn re_item() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s+(-?\d+): (.*?)\s*$").unwrap())
}

fn re_attr(attr: &str) -> Regex {
    Regex::new(&format!(r"(?:^|\s){}=(-?\w+)", attr)).unwrap()
}

struct Attrs {
    min: Regex,
    max: Regex,
    step: Regex,
    default: Regex,
    value: Regex,
    flags: Regex,
}

fn attrs() -> &'static Attrs {
    static ATTRS: OnceLock<Attrs> = OnceLock::new();
    ATTRS.get_or_init(|| Attrs {
        min: re_attr("min"),
        max: re_attr("max"),
        step: re_attr("step"),
        default: re_attr("default"),
        value: re_attr("value"),
        flags: Regex::new(r"(?:^|\s)flags=([\w-]+(?:,\s*[\w-]+)*)").unwrap(),
    })
}

/// Decimal or `0x` prefixed hexadecimal, as `v4l2-ctl` prints bitmasks.
pub fn parse_int(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };

    Some(if negative { -value } else { value })
}

fn int_attr(re: &Regex, rest: &str) -> Option<i64> {
    re.captures(rest).and_then(|caps| parse_int(&caps[1]))
}

/// Parse one control line, returning its name and attributes.
pub fn parse_line(line: &str) -> Option<(String, Control)> {
    let caps = re_ctrl().captures(line)?;
    let attrs = attrs();
    let rest = &caps[3];

    let kind = caps[2].parse::<CtrlType>().unwrap_or(CtrlType::Unknown);
    let control = Control {
        kind,
        min: int_attr(&attrs.min, rest),
        max: int_attr(&attrs.max, rest),
        step: int_attr(&attrs.step, rest),
        default: int_attr(&attrs.default, rest),
        value: int_attr(&attrs.value, rest),
        flags: attrs
            .flags
            .captures(rest)
            .map(|caps| Flags::from(&caps[1]))
            .unwrap_or_default(),
        items: vec![],
    };

    Some((caps[1].to_owned(), control))
}

/// Parse a control listing. Lines that describe nothing (class headers, blanks) are skipped.
pub fn parse_list(text: &str) -> Controls {
    let mut controls = Controls::new();
    let mut last: Option<String> = None;

    for line in text.lines() {
        if let Some((name, control)) = parse_line(line) {
            last = Some(name.clone());
            controls.insert(name, control);
            continue;
        }

        if let Some(caps) = re_item().captures(line) {
            let owner = last.as_ref().and_then(|name| controls.get_mut(name));
            match (owner, parse_int(&caps[1])) {
                (Some(ctrl), Some(index)) if ctrl.is_discrete() => ctrl.items.push(MenuItem {
                    index,
                    name: caps[2].to_owned(),
                }),
                _ => debug!("stray menu line: {:?}", line),
            }
            continue;
        }

        if !line.trim().is_empty() {
            last = None;
        }
    }

    controls
}

/// Parse the output of `--get-ctrl <name>`, e.g. `brightness: -12`.
pub fn parse_value(text: &str) -> Result<i64> {
    text.lines()
        .filter_map(|line| line.rsplit_once(':'))
        .find_map(|(_, value)| parse_int(value.trim()))
        .ok_or_else(|| Error::Parse(text.trim().to_owned()))
}

/// Driver control name to the identifier `v4l2-ctl` accepts.
///
/// `"White Balance Temperature, Auto"` becomes `white_balance_temperature_auto`.
pub fn normalize_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut gap = false;

    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            if gap {
                name.push('_');
            }
            gap = false;
            name.push(c.to_ascii_lowercase());
        } else if !name.is_empty() {
            gap = true;
        }
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::FLAG_INACTIVE;

    const LISTING: &str = "
User Controls

                     brightness 0x00980900 (int)    : min=-64 max=64 step=1 default=0 value=-12
                       contrast 0x00980901 (int)    : min=0 max=95 step=1 default=0 value=0
        white_balance_automatic 0x0098090c (bool)   : default=1 value=1
           power_line_frequency 0x00980918 (menu)   : min=0 max=2 default=1 value=1 (50 Hz)
\t\t\t\t0: Disabled
\t\t\t\t1: 50 Hz
\t\t\t\t2: 60 Hz
      white_balance_temperature 0x0098091a (int)    : min=2800 max=6500 step=1 default=4600 value=4600 flags=inactive
               do_white_balance 0x0098090d (button) : flags=write-only, execute-on-write

Camera Controls

                  auto_exposure 0x009a0901 (menu)   : min=0 max=3 default=3 value=3 (Aperture Priority Mode)
         exposure_time_absolute 0x009a0902 (int)    : min=1 max=5000 step=1 default=157 value=157 flags=inactive
                   pan_absolute 0x009a0908 (int)    : min=-36000 max=36000 step=3600 default=0 value=0
                     test_flags 0x009a0999 (bitmask): max=0x0000000f default=0x00000003 value=0x00000001
";

    #[test]
    fn listing() {
        let controls = parse_list(LISTING);
        let names: Vec<_> = controls.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            [
                "brightness",
                "contrast",
                "white_balance_automatic",
                "power_line_frequency",
                "white_balance_temperature",
                "do_white_balance",
                "auto_exposure",
                "exposure_time_absolute",
                "pan_absolute",
                "test_flags",
            ]
        );

        let brightness = &controls["brightness"];
        assert_eq!(brightness.kind, CtrlType::Integer);
        assert_eq!(brightness.min, Some(-64));
        assert_eq!(brightness.max, Some(64));
        assert_eq!(brightness.step, Some(1));
        assert_eq!(brightness.default, Some(0));
        assert_eq!(brightness.value, Some(-12));
        assert!(brightness.flags.is_empty());

        let awb = &controls["white_balance_automatic"];
        assert_eq!(awb.kind, CtrlType::Boolean);
        assert_eq!((awb.min, awb.default, awb.value), (None, Some(1), Some(1)));

        let plf = &controls["power_line_frequency"];
        assert_eq!(plf.kind, CtrlType::Menu);
        assert_eq!(plf.value, Some(1));
        assert_eq!(plf.items.len(), 3);
        assert_eq!(plf.selected_item().map(|i| i.name.as_str()), Some("50 Hz"));

        assert!(controls["white_balance_temperature"].is_inactive());
        assert!(controls["exposure_time_absolute"].flags.contains(FLAG_INACTIVE));

        let button = &controls["do_white_balance"];
        assert_eq!(button.kind, CtrlType::Button);
        assert!(button.flags.contains("write-only"));
        assert!(button.flags.contains("execute-on-write"));
        assert_eq!(button.value, None);

        assert_eq!(controls["pan_absolute"].min, Some(-36000));
        assert_eq!(controls["pan_absolute"].step, Some(3600));

        let mask = &controls["test_flags"];
        assert_eq!(mask.kind, CtrlType::Bitmask);
        assert_eq!((mask.max, mask.default, mask.value), (Some(15), Some(3), Some(1)));
    }

    #[test]
    fn headers_only() {
        assert!(parse_list("User Controls\n\nCamera Controls\n").is_empty());
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn non_numeric_attributes_are_ignored() {
        let (name, ctrl) =
            parse_line("    device_name 0x00a00001 (str)    : min=0 max=32 step=1 value='cam'")
                .unwrap();
        assert_eq!(name, "device_name");
        assert_eq!(ctrl.kind, CtrlType::String);
        assert_eq!(ctrl.max, Some(32));
        assert_eq!(ctrl.value, None);
    }

    #[test]
    fn int64_type() {
        let (_, ctrl) = parse_line(
            "  pixel_rate 0x009f0902 (int64)  : min=1 max=2147483647 step=1 default=1 value=96000000 flags=read-only",
        )
        .unwrap();
        assert_eq!(ctrl.kind, CtrlType::Integer64);
        assert_eq!(ctrl.value, Some(96_000_000));
        assert!(ctrl.is_read_only());
    }

    #[test]
    fn values() {
        assert_eq!(parse_value("brightness: 0\n").unwrap(), 0);
        assert_eq!(parse_value("brightness: -12\n").unwrap(), -12);
        assert_eq!(parse_value("test_flags: 0x00000005").unwrap(), 5);
        assert!(matches!(parse_value("nothing here"), Err(Error::Parse(_))));
        assert!(parse_value("").is_err());
    }

    #[test]
    fn ints() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("0x1f"), Some(31));
        assert_eq!(parse_int("inactive"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn names() {
        assert_eq!(normalize_name("Brightness"), "brightness");
        assert_eq!(
            normalize_name("White Balance Temperature, Auto"),
            "white_balance_temperature_auto"
        );
        assert_eq!(normalize_name("Exposure (Absolute)"), "exposure_absolute");
        assert_eq!(normalize_name("  Pan, Absolute  "), "pan_absolute");
        assert_eq!(normalize_name("Power Line Frequency"), "power_line_frequency");
    }
}

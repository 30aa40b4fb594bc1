use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Controls keyed by the name `v4l2-ctl` uses, in the order the device lists them.
pub type Controls = IndexMap<String, Control>;

/// [Details](https://www.kernel.org/doc/html/latest/userspace-api/media/v4l/vidioc-queryctrl.html#v4l2-ctrl-type)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CtrlType {
    #[serde(rename = "int")]
    Integer,
    #[serde(rename = "bool")]
    Boolean,
    #[serde(rename = "menu")]
    Menu,
    #[serde(rename = "intmenu")]
    IntegerMenu,
    #[serde(rename = "int64")]
    Integer64,
    #[serde(rename = "bitmask")]
    Bitmask,
    #[serde(rename = "button")]
    Button,
    #[serde(rename = "str")]
    String,
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl CtrlType {
    pub fn as_str(&self) -> &'static str {
        match *self {
            CtrlType::Integer => "int",
            CtrlType::Boolean => "bool",
            CtrlType::Menu => "menu",
            CtrlType::IntegerMenu => "intmenu",
            CtrlType::Integer64 => "int64",
            CtrlType::Bitmask => "bitmask",
            CtrlType::Button => "button",
            CtrlType::String => "str",
            CtrlType::Unknown => "unknown",
        }
    }
}

impl FromStr for CtrlType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<CtrlType, Self::Err> {
        Ok(match s {
            "int" => CtrlType::Integer,
            "bool" => CtrlType::Boolean,
            "menu" => CtrlType::Menu,
            "intmenu" => CtrlType::IntegerMenu,
            "int64" => CtrlType::Integer64,
            "bitmask" => CtrlType::Bitmask,
            "button" => CtrlType::Button,
            "str" => CtrlType::String,
            _ => CtrlType::Unknown,
        })
    }
}

impl fmt::Display for CtrlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Flag words as printed by `v4l2-ctl`, e.g. `inactive, slider`.
///
/// Stored on disk as the same comma separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Flags(Vec<String>);

pub const FLAG_INACTIVE: &str = "inactive";
pub const FLAG_READ_ONLY: &str = "read-only";
pub const FLAG_SLIDER: &str = "slider";

impl Flags {
    pub fn new<I, S>(words: I) -> Flags
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Flags(words.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, flag: &str) -> bool {
        self.0.iter().any(|f| f == flag)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Flags {
    fn from(s: String) -> Flags {
        Flags::from(s.as_str())
    }
}

impl From<&str> for Flags {
    fn from(s: &str) -> Flags {
        Flags::new(s.split(',').map(str::trim).filter(|w| !w.is_empty()))
    }
}

impl From<Flags> for String {
    fn from(flags: Flags) -> String {
        flags.0.join(", ")
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub index: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Control {
    #[serde(rename = "type")]
    pub kind: CtrlType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    #[serde(default, skip_serializing_if = "Flags::is_empty")]
    pub flags: Flags,
    /// Menu entries, known only when the listing included them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<MenuItem>,
}

/// How a control is presented in the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Toggle,
    Slider { min: i64, max: i64, step: i64 },
    Choice,
    Trigger,
    None,
}

impl Control {
    pub fn new(kind: CtrlType) -> Control {
        Control {
            kind,
            min: None,
            max: None,
            step: None,
            default: None,
            value: None,
            flags: Flags::default(),
            items: vec![],
        }
    }

    pub fn is_inactive(&self) -> bool {
        self.flags.contains(FLAG_INACTIVE)
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(FLAG_READ_ONLY)
    }

    /// Booleans and menus may change which other controls are usable, so they go first.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self.kind,
            CtrlType::Boolean | CtrlType::Menu | CtrlType::IntegerMenu
        )
    }

    pub fn has_value(&self) -> bool {
        !matches!(self.kind, CtrlType::Button | CtrlType::String) && self.value.is_some()
    }

    pub fn widget(&self) -> Widget {
        match self.kind {
            CtrlType::Boolean => return Widget::Toggle,
            CtrlType::Button => return Widget::Trigger,
            CtrlType::String | CtrlType::Unknown => return Widget::None,
            CtrlType::Menu | CtrlType::IntegerMenu if !self.items.is_empty() => {
                return Widget::Choice
            }
            _ => {}
        }

        match (self.min, self.max) {
            (Some(min), Some(max)) => Widget::Slider {
                min,
                max,
                step: self.step.filter(|&s| s > 0).unwrap_or(1),
            },
            _ => Widget::None,
        }
    }

    /// Name of the menu entry the current value selects.
    pub fn selected_item(&self) -> Option<&MenuItem> {
        let value = self.value?;
        self.items.iter().find(|item| item.index == value)
    }
}

/// Row label for a control: `white_balance_temperature` -> `WB temperature:`.
pub fn display_label(name: &str) -> String {
    let spaced = name.replace('_', " ").to_lowercase();
    let mut chars = spaced.chars();
    let mut label = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    label.push(':');
    label.replace("White balance temperature", "WB temperature")
}

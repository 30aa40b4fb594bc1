//! Cached view of the device controls.

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::control::{Control, Controls, CtrlType};
use crate::{Error, Result};

/// Outcome of a successful `set_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Written,
    /// The control is inactive, nothing was sent.
    Skipped,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    pub written: usize,
    pub skipped: usize,
    /// Controls the device refused.
    pub failed: Vec<String>,
}

impl UpdateReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, name: &str, result: Result<Applied>) {
        match result {
            Ok(Applied::Written) => self.written += 1,
            Ok(Applied::Skipped) => self.skipped += 1,
            Err(_) => self.failed.push(name.to_owned()),
        }
    }
}

pub struct CameraControl<B> {
    backend: B,
    ctrls: Controls,
}

impl<B: Backend> CameraControl<B> {
    pub fn new(backend: B) -> Result<CameraControl<B>> {
        let mut camera = CameraControl {
            backend,
            ctrls: Controls::new(),
        };

        camera.refresh()?;
        Ok(camera)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn controls(&self) -> &Controls {
        &self.ctrls
    }

    pub fn get(&self, name: &str) -> Option<&Control> {
        self.ctrls.get(name)
    }

    /// Re-read every control from the device.
    pub fn refresh(&mut self) -> Result<()> {
        self.ctrls = self.backend.list()?;
        debug!("{} controls listed", self.ctrls.len());
        Ok(())
    }

    /// Read a value from the device into the cache.
    pub fn get_value(&mut self, name: &str) -> Result<i64> {
        let ctrl = self
            .ctrls
            .get_mut(name)
            .ok_or_else(|| Error::UnknownControl(name.to_owned()))?;

        match self.backend.get(name) {
            Ok(value) => {
                ctrl.value = Some(value);
                Ok(value)
            }
            Err(err) => {
                warn!("could not read value of {}: {}", name, err);
                Err(err)
            }
        }
    }

    /// Write a value. Inactive controls are left alone.
    pub fn set_value(&mut self, name: &str, value: i64) -> Result<Applied> {
        let ctrl = self
            .ctrls
            .get_mut(name)
            .ok_or_else(|| Error::UnknownControl(name.to_owned()))?;

        if ctrl.is_inactive() {
            debug!("{} is inactive, not setting {}", name, value);
            return Ok(Applied::Skipped);
        }

        if let Err(err) = self.backend.set(name, value) {
            warn!("could not set value {} for {}: {}", value, name, err);
            return Err(err);
        }

        debug!("{} = {}", name, value);
        ctrl.value = Some(value);
        Ok(Applied::Written)
    }

    /// Flip a boolean control, then re-sync so dependent controls pick up their new state.
    pub fn toggle(&mut self, name: &str) -> Result<Applied> {
        let on = self
            .ctrls
            .get(name)
            .ok_or_else(|| Error::UnknownControl(name.to_owned()))?
            .value
            .map_or(false, |v| v != 0);

        let applied = self.set_value(name, if on { 0 } else { 1 });

        if let Err(err) = self.refresh() {
            warn!("could not re-sync controls: {}", err);
        }

        applied
    }

    /// Push the cached values (or the defaults when `reset`) to the device.
    ///
    /// Booleans and menus go first because they switch other controls between active and
    /// inactive; flags are re-read before the remaining controls are written.
    pub fn update(&mut self, reset: bool) -> UpdateReport {
        let targets: Vec<(String, bool, i64)> = self
            .ctrls
            .iter()
            .filter(|(_, c)| writable(c))
            .filter_map(|(name, c)| {
                let value = if reset { c.default } else { c.value }?;
                Some((name.clone(), c.is_discrete(), value))
            })
            .collect();

        let mut report = UpdateReport::default();

        for (name, _, value) in targets.iter().filter(|t| t.1) {
            let result = self.set_value(name, *value);
            report.record(name, result);
        }

        if let Err(err) = self.refresh_flags() {
            warn!("could not re-read control flags: {}", err);
        }

        for (name, _, value) in targets.iter().filter(|t| !t.1) {
            let result = self.set_value(name, *value);
            report.record(name, result);
        }

        info!(
            "{} controls written, {} skipped, {} failed",
            report.written,
            report.skipped,
            report.failed.len()
        );

        report
    }

    /// Take the values of a saved profile and apply them.
    ///
    /// Controls the device does not have are ignored. Values are sent as saved: their valid
    /// range may only open up once the booleans and menus are written, and the device rejects
    /// what is still out of range.
    pub fn apply_profile(&mut self, profile: &Controls) -> UpdateReport {
        for (name, saved) in profile {
            match (self.ctrls.get_mut(name), saved.value) {
                (Some(ctrl), Some(value)) => ctrl.value = Some(value),
                (Some(_), None) => {}
                (None, _) => warn!("{} is not a control of this device", name),
            }
        }

        let report = self.update(false);

        if let Err(err) = self.refresh() {
            warn!("could not re-sync controls: {}", err);
        }

        report
    }

    /// Update flags and ranges from the device, keeping the cached values.
    fn refresh_flags(&mut self) -> Result<()> {
        let fresh = self.backend.list()?;

        for (name, ctrl) in self.ctrls.iter_mut() {
            if let Some(new) = fresh.get(name) {
                ctrl.flags = new.flags.clone();
                ctrl.min = new.min;
                ctrl.max = new.max;
                ctrl.step = new.step;
            }
        }

        Ok(())
    }
}

fn writable(ctrl: &Control) -> bool {
    !matches!(
        ctrl.kind,
        CtrlType::Button | CtrlType::String | CtrlType::Unknown
    ) && !ctrl.is_read_only()
}

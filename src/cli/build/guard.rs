//! Busy flags for build phases.

use anyhow::{Result, bail};
use std::sync::atomic::{AtomicBool, Ordering};

/// One running-or-not flag.
#[derive(Debug, Default)]
pub struct Busy(AtomicBool);

impl Busy {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Set the flag until the returned guard drops.
    pub fn claim(&self, phase: &str) -> Result<BusyGuard<'_>> {
        if self
            .0
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            bail!("{phase} is already running");
        }
        Ok(BusyGuard(&self.0))
    }
}

/// Clears its flag on drop, including on early return.
#[must_use]
#[derive(Debug)]
pub struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
pub struct BusyFlags {
    pub delete: Busy,
    pub build: Busy,
    pub styles: Busy,
    pub scripts: Busy,
    pub mirror: Busy,
    pub documents: Busy,
}

impl BusyFlags {
    fn all(&self) -> [(&'static str, &Busy); 6] {
        [
            ("delete", &self.delete),
            ("build", &self.build),
            ("styles", &self.styles),
            ("scripts", &self.scripts),
            ("mirror", &self.mirror),
            ("documents", &self.documents),
        ]
    }

    /// Fail when any phase is running.
    pub fn no_other(&self, phase: &str) -> Result<()> {
        if let Some((running, _)) = self.all().into_iter().find(|(_, busy)| busy.is_set()) {
            bail!("cannot start {phase}: {running} is already running");
        }
        Ok(())
    }

    /// Fail when a delete is running.
    pub fn no_delete(&self, phase: &str) -> Result<()> {
        if self.delete.is_set() {
            bail!("cannot start {phase}: delete is already running");
        }
        Ok(())
    }

    /// Claim `busy` unless it or a delete is running.
    pub fn claim_phase<'a>(&self, busy: &'a Busy, phase: &str) -> Result<BusyGuard<'a>> {
        self.no_delete(phase)?;
        busy.claim(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_releases_on_drop() {
        let flags = BusyFlags::default();
        {
            let _guard = flags.styles.claim("styles").unwrap();
            assert!(flags.styles.claim("styles").is_err());
            assert!(flags.no_other("build").is_err());
            flags.no_delete("scripts").unwrap();
        }
        assert!(!flags.styles.is_set());
        flags.no_other("build").unwrap();
    }

    #[test]
    fn test_delete_blocks_phases() {
        let flags = BusyFlags::default();
        let _guard = flags.delete.claim("delete").unwrap();
        let err = flags.claim_phase(&flags.mirror, "mirror").unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot start mirror: delete is already running"
        );
        assert!(!flags.mirror.is_set());
    }
}

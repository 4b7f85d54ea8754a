//! The non-destructive adjustment chain: an ordered list of tonal steps
//! replayed onto a cached base raster.
//!
//! Invariant: a non-empty step list always has a base to replay onto, and
//! an empty list never keeps one. Direct raster edits break any cached
//! relationship between base and working bitmap, so they clear both.

use super::{EditError, EditResult, ImageDocument};
use crate::adjust::{self, AdjustmentStep};

impl ImageDocument {
    /// Commits one adjustment step. A neutral step is rejected before any
    /// state is touched, so rejected submissions are invisible to history
    /// and the revision counter.
    pub fn append_adjustment(&mut self, step: AdjustmentStep) -> EditResult<()> {
        let step = step.normalized();
        if step.is_neutral() {
            tracing::debug!("neutral adjustment step rejected");
            return Err(EditError::NoOpAdjustment);
        }
        self.push_history("Adjustment step")?;
        if self.adjustment_base.is_none() {
            self.adjustment_base = Some(self.working.clone());
        }
        self.adjustment_steps.push(step);
        self.rebuild_from_adjustments();
        self.clear_overlays_silent();
        tracing::debug!(steps = self.adjustment_steps.len(), "adjustment step appended");
        Ok(())
    }

    /// Replaces a previously committed step and replays the chain.
    pub fn update_adjustment_at(&mut self, index: usize, step: AdjustmentStep) -> EditResult<()> {
        let len = self.adjustment_steps.len();
        if index >= len {
            return Err(EditError::InvalidStepIndex { index, len });
        }
        let step = step.normalized();
        if step.is_neutral() {
            return Err(EditError::NoOpAdjustment);
        }
        self.push_history("Edit adjustment step")?;
        self.adjustment_steps[index] = step;
        self.rebuild_from_adjustments();
        self.clear_overlays_silent();
        Ok(())
    }

    /// Removes one step. Emptying the chain restores the working bitmap to
    /// the cached base and drops the cache.
    pub fn remove_adjustment_at(&mut self, index: usize) -> EditResult<()> {
        let len = self.adjustment_steps.len();
        if index >= len {
            return Err(EditError::InvalidStepIndex { index, len });
        }
        self.push_history("Remove adjustment step")?;
        self.adjustment_steps.remove(index);
        if self.adjustment_steps.is_empty() {
            self.restore_working_from_base();
            self.refresh_dirty()?;
        } else {
            self.rebuild_from_adjustments();
        }
        self.clear_overlays_silent();
        Ok(())
    }

    /// Drops the whole chain, restoring the working bitmap to the base. An
    /// already-empty chain is a reported no-op.
    pub fn clear_adjustments(&mut self) -> EditResult<()> {
        if self.adjustment_steps.is_empty() {
            return Err(EditError::NoOpAdjustment);
        }
        self.push_history("Clear adjustment steps")?;
        self.adjustment_steps.clear();
        self.restore_working_from_base();
        self.refresh_dirty()?;
        self.clear_overlays_silent();
        Ok(())
    }

    /// Recomputes the working bitmap as the in-order fold of the step list
    /// over the base. Returns false when there is no chain to replay.
    pub fn rebuild_from_adjustments(&mut self) -> bool {
        let Some(base) = self.adjustment_base.as_ref() else {
            return false;
        };
        if self.adjustment_steps.is_empty() {
            return false;
        }
        let mut working = base.clone();
        for step in &self.adjustment_steps {
            working = adjust::apply_step(&working, *step);
        }
        self.working = working;
        self.mark_modified();
        true
    }

    /// Unconditionally forgets the chain without rebuilding. Called by every
    /// direct raster edit; replaying stale filter parameters onto geometry
    /// that no longer matches would corrupt the frame.
    pub fn invalidate_adjustments(&mut self) {
        if self.adjustment_steps.is_empty() && self.adjustment_base.is_none() {
            return;
        }
        self.adjustment_steps.clear();
        self.adjustment_base = None;
        tracing::debug!("adjustment chain invalidated");
    }

    fn restore_working_from_base(&mut self) {
        if let Some(base) = self.adjustment_base.take() {
            self.working = base;
        }
        self.mark_modified();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_document;
    use super::*;
    use crate::adjust::apply_step;

    #[test]
    fn append_captures_base_and_snapshots_history() {
        let mut doc = test_document(64, 64);
        let pre_adjustment = doc.working().clone();

        doc.append_adjustment(AdjustmentStep::new(120, 100, 100, 0))
            .expect("non-neutral step should commit");

        assert_eq!(doc.adjustment_steps().len(), 1);
        assert_eq!(doc.adjustment_base(), Some(&pre_adjustment));
        assert_eq!(doc.history_len(), 1);
        assert!(doc.dirty());
        assert_ne!(doc.working(), &pre_adjustment);
    }

    #[test]
    fn append_undo_redo_round_trips_the_chain() {
        let mut doc = test_document(64, 64);
        let pre_adjustment = doc.working().clone();
        let step = AdjustmentStep::new(120, 100, 100, 0);
        doc.append_adjustment(step).expect("commit");

        doc.undo().expect("undo should apply");
        assert!(doc.adjustment_steps().is_empty());
        assert!(doc.adjustment_base().is_none());
        assert_eq!(doc.working(), &pre_adjustment);
        assert_eq!(doc.future_len(), 1);

        doc.redo().expect("redo should apply");
        assert_eq!(doc.adjustment_steps(), &[step]);
        assert_eq!(doc.adjustment_base(), Some(&pre_adjustment));
    }

    #[test]
    fn neutral_append_changes_nothing_observable() {
        let mut doc = test_document(16, 16);
        let revision = doc.revision();
        let err = doc
            .append_adjustment(AdjustmentStep::NEUTRAL)
            .expect_err("neutral step must be rejected");
        assert!(matches!(err, EditError::NoOpAdjustment));
        assert!(doc.adjustment_steps().is_empty());
        assert!(doc.adjustment_base().is_none());
        assert_eq!(doc.history_len(), 0);
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn working_bitmap_equals_fold_of_steps_over_base() {
        let mut doc = test_document(32, 32);
        let steps = [
            AdjustmentStep::new(120, 100, 100, 0),
            AdjustmentStep::new(100, 140, 100, 0),
            AdjustmentStep::new(100, 100, 60, 2),
        ];
        for step in steps {
            doc.append_adjustment(step).expect("commit");
        }

        let base = doc.adjustment_base().expect("base should exist").clone();
        let mut expected = base;
        for step in doc.adjustment_steps().to_vec() {
            expected = apply_step(&expected, step);
        }
        assert_eq!(doc.working(), &expected);
    }

    #[test]
    fn removing_the_last_step_rebuilds_all_but_last() {
        let mut doc = test_document(32, 32);
        let first = AdjustmentStep::new(120, 100, 100, 0);
        let second = AdjustmentStep::new(100, 160, 100, 0);
        doc.append_adjustment(first).expect("commit");
        doc.append_adjustment(second).expect("commit");

        let base = doc.adjustment_base().expect("base should exist").clone();
        doc.remove_adjustment_at(1).expect("remove should succeed");

        assert_eq!(doc.adjustment_steps(), &[first]);
        assert_eq!(doc.working(), &apply_step(&base, first));
    }

    #[test]
    fn emptying_the_chain_restores_the_base_exactly() {
        let mut doc = test_document(32, 32);
        let pre_adjustment = doc.working().clone();
        doc.append_adjustment(AdjustmentStep::new(140, 100, 100, 0))
            .expect("commit");

        doc.remove_adjustment_at(0).expect("remove should succeed");
        assert!(doc.adjustment_steps().is_empty());
        assert!(doc.adjustment_base().is_none());
        assert_eq!(doc.working(), &pre_adjustment);
        assert!(!doc.dirty());
    }

    #[test]
    fn clear_restores_base_and_rejects_when_empty() {
        let mut doc = test_document(32, 32);
        assert!(matches!(
            doc.clear_adjustments(),
            Err(EditError::NoOpAdjustment)
        ));

        let pre_adjustment = doc.working().clone();
        doc.append_adjustment(AdjustmentStep::new(60, 120, 180, 1))
            .expect("commit");
        doc.append_adjustment(AdjustmentStep::new(100, 100, 0, 0))
            .expect("commit");

        doc.clear_adjustments().expect("clear should succeed");
        assert!(doc.adjustment_steps().is_empty());
        assert!(doc.adjustment_base().is_none());
        assert_eq!(doc.working(), &pre_adjustment);
    }

    #[test]
    fn update_rewrites_a_step_and_replays_from_base() {
        let mut doc = test_document(32, 32);
        doc.append_adjustment(AdjustmentStep::new(120, 100, 100, 0))
            .expect("commit");
        let base = doc.adjustment_base().expect("base should exist").clone();

        let replacement = AdjustmentStep::new(100, 180, 100, 0);
        doc.update_adjustment_at(0, replacement)
            .expect("update should succeed");
        assert_eq!(doc.adjustment_steps(), &[replacement]);
        assert_eq!(doc.working(), &apply_step(&base, replacement));
    }

    #[test]
    fn index_errors_leave_the_document_alone() {
        let mut doc = test_document(16, 16);
        doc.append_adjustment(AdjustmentStep::new(120, 100, 100, 0))
            .expect("commit");
        let history_before = doc.history_len();

        assert!(matches!(
            doc.update_adjustment_at(5, AdjustmentStep::new(120, 100, 100, 0)),
            Err(EditError::InvalidStepIndex { index: 5, len: 1 })
        ));
        assert!(matches!(
            doc.remove_adjustment_at(1),
            Err(EditError::InvalidStepIndex { index: 1, len: 1 })
        ));
        assert_eq!(doc.history_len(), history_before);
        assert_eq!(doc.adjustment_steps().len(), 1);
    }

    #[test]
    fn out_of_range_input_is_clamped_on_the_way_in() {
        let mut doc = test_document(16, 16);
        doc.append_adjustment(AdjustmentStep::new(9_999, -50, 9_999, 200))
            .expect("clamped step is not neutral");
        let step = doc.adjustment_steps()[0];
        assert_eq!(step.brightness, 180);
        assert_eq!(step.contrast, 40);
        assert_eq!(step.saturation, 220);
        assert_eq!(step.blur, 12);
    }
}

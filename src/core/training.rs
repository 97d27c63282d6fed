//! Validation-loss driven stopping and learning-rate scheduling.
//!
//! The gradient loop itself belongs to the training framework; these state
//! machines only decide, epoch by epoch, whether to halt and what learning
//! rate to use next, so a driver can steer any framework with the same
//! policy: stop after `patience` epochs without improvement (restoring the
//! best epoch's weights) and halve the learning rate on a plateau.

/// Per-epoch verdict of [`EarlyStopping`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    Continue,
    /// Halt training and restore the weights of [`EarlyStopping::best_epoch`]
    Stop,
}

/// Early stopping on validation loss
#[derive(Debug, Clone)]
pub struct EarlyStopping {
    /// Epochs without improvement before stopping
    pub patience: usize,
    /// Smallest loss decrease that counts as improvement
    pub min_delta: f64,
    best_loss: Option<f64>,
    best_epoch: Option<usize>,
    epochs_seen: usize,
    wait: usize,
}

impl EarlyStopping {
    pub fn new(patience: usize) -> Self {
        Self {
            patience,
            min_delta: 0.0,
            best_loss: None,
            best_epoch: None,
            epochs_seen: 0,
            wait: 0,
        }
    }

    /// Record the validation loss of the epoch that just finished
    pub fn observe(&mut self, val_loss: f64) -> StopDecision {
        let epoch = self.epochs_seen;
        self.epochs_seen += 1;

        let improved = match self.best_loss {
            Some(best) => val_loss < best - self.min_delta,
            None => true,
        };

        if improved {
            self.best_loss = Some(val_loss);
            self.best_epoch = Some(epoch);
            self.wait = 0;
            return StopDecision::Continue;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            log::info!(
                "Early stopping after epoch {}: no improvement for {} epochs (best: {:.6} at epoch {})",
                epoch,
                self.wait,
                self.best_loss.unwrap_or(f64::INFINITY),
                self.best_epoch.unwrap_or(0)
            );
            StopDecision::Stop
        } else {
            StopDecision::Continue
        }
    }

    /// Epoch whose weights should be restored on stop
    pub fn best_epoch(&self) -> Option<usize> {
        self.best_epoch
    }

    pub fn best_loss(&self) -> Option<f64> {
        self.best_loss
    }
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Learning-rate reduction on a validation-loss plateau
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    /// Multiplier applied to the learning rate on a plateau
    pub factor: f64,
    /// Epochs without improvement before reducing
    pub patience: usize,
    /// Floor below which the rate is never reduced
    pub min_lr: f64,
    best_loss: Option<f64>,
    wait: usize,
}

impl ReduceLrOnPlateau {
    pub fn new(factor: f64, patience: usize, min_lr: f64) -> Self {
        Self {
            factor,
            patience,
            min_lr,
            best_loss: None,
            wait: 0,
        }
    }

    /// Record an epoch's validation loss and return the rate for the next
    /// epoch, reduced when the loss has plateaued.
    pub fn observe(&mut self, val_loss: f64, current_lr: f64) -> f64 {
        let improved = match self.best_loss {
            Some(best) => val_loss < best,
            None => true,
        };

        if improved {
            self.best_loss = Some(val_loss);
            self.wait = 0;
            return current_lr;
        }

        self.wait += 1;
        if self.wait >= self.patience {
            self.wait = 0;
            let reduced = (current_lr * self.factor).max(self.min_lr);
            if reduced < current_lr {
                log::info!("Reducing learning rate: {:e} -> {:e}", current_lr, reduced);
            }
            reduced
        } else {
            current_lr
        }
    }
}

impl Default for ReduceLrOnPlateau {
    fn default() -> Self {
        Self::new(0.5, 2, 1e-6)
    }
}

/// Recompile recipe for the fine-tuning stage: unfreeze the base sub-model
/// and continue with a much lower learning rate under the same stopping and
/// scheduling policy.
#[derive(Debug, Clone, PartialEq)]
pub struct FineTunePlan {
    /// Layer index in the base model from which to unfreeze (0 = all)
    pub unfreeze_from_layer: usize,
    pub learning_rate: f64,
}

impl Default for FineTunePlan {
    fn default() -> Self {
        Self {
            unfreeze_from_layer: 0,
            learning_rate: 1e-5,
        }
    }
}

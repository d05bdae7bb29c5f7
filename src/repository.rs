use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::defaults::{DefaultValueProvider, EmptyDefault};
use crate::verify::VerificationFailed;
use crate::{lock, Capability, Double, DoubleBuilder, Failure, Fake, Mode, Value};

/// Creates doubles sharing one behavior mode and default value strategy, and
/// verifies all of them in one go.
pub struct Repository {
    mode: Mode,
    default_value: Arc<dyn DefaultValueProvider>,
    doubles: Mutex<Vec<Double>>,
}

impl Repository {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            default_value: Arc::new(EmptyDefault),
            doubles: Mutex::new(Vec::new()),
        }
    }

    pub fn default_value(mut self, provider: impl DefaultValueProvider + 'static) -> Self {
        self.default_value = Arc::new(provider);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn create(&self, capability: Capability) -> Result<Double, Failure> {
        self.adopt(Double::builder(capability))
    }

    /// Class double built with constructor arguments.
    pub fn create_with(
        &self,
        capability: Capability,
        args: impl IntoIterator<Item = Value>,
    ) -> Result<Double, Failure> {
        self.adopt(Double::builder(capability).args(args))
    }

    pub fn fake<T: Fake>(&self) -> Result<T, Failure> {
        self.create(T::capability()).map(T::from_double)
    }

    /// Builds `builder` with the repository's mode and strategy and keeps the
    /// result for batch verification.
    pub fn adopt(&self, builder: DoubleBuilder) -> Result<Double, Failure> {
        let double = builder
            .mode(self.mode)
            .default_value_shared(self.default_value.clone())
            .build()?;
        lock(&self.doubles).push(double.clone());
        Ok(double)
    }

    pub fn doubles(&self) -> Vec<Double> {
        lock(&self.doubles).clone()
    }

    /// [Double::verify_all_expectations_met] over every double.
    pub fn verify(&self) -> Result<(), Failure> {
        self.verify_each(|double| double.check_expectations(|e| e.is_verifiable()))
    }

    /// [Double::verify_all_setups] over every double.
    pub fn verify_all(&self) -> Result<(), Failure> {
        self.verify_each(|double| double.check_expectations(|e| !e.is_implicit()))
    }

    /// [Double::verify_no_other_calls] over every double.
    pub fn verify_no_other_calls(&self) -> Result<(), Failure> {
        self.verify_each(Double::check_no_other_calls)
    }

    fn verify_each(
        &self,
        check: impl Fn(&Double) -> Result<(), VerificationFailed>,
    ) -> Result<(), Failure> {
        let mut failures: Vec<VerificationFailed> = self
            .doubles()
            .iter()
            .filter_map(|double| check(double).err())
            .collect();
        debug!(failed = failures.len(), "repository verified");
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0).into()),
            _ => Err(VerificationFailed::Multiple(failures).into()),
        }
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("mode", &self.mode)
            .field("default_value", &self.default_value)
            .field("doubles", &lock(&self.doubles).len())
            .finish()
    }
}

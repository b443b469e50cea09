//! Lookup of protection bindings by service and element.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use thiserror::Error;
use tracing::debug;

use super::{CheckOutcome, E2eConfig, E2eError};
use crate::message::{Header, MethodId, ServiceId};

/// Errors raised when registering a binding.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A binding for this element already exists.
    #[error("element {service}.{element} already has a protection binding")]
    AlreadyRegistered { service: ServiceId, element: MethodId },
    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] E2eError),
}

/// Protection bindings keyed by `(service, method or event)`.
///
/// Bindings are immutable once registered; readers receive a shared handle.
/// Profiles with receive-side counter checks also keep the last accepted
/// counter per element here.
#[derive(Debug, Default)]
pub struct E2eRegistry {
    bindings: DashMap<(ServiceId, MethodId), Arc<E2eConfig>>,
    last_counters: DashMap<(ServiceId, MethodId), u16>,
}

impl E2eRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Bind `config` to `service`/`element`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the element is already
    /// bound, or [`RegistryError::Config`] if the configuration is invalid.
    pub fn register(
        &self,
        service: ServiceId,
        element: MethodId,
        config: E2eConfig,
    ) -> Result<(), RegistryError> {
        config.validate()?;
        match self.bindings.entry((service, element)) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered { service, element }),
            Entry::Vacant(vacant) => {
                debug!(%service, %element, profile = %config.kind(), "protection binding registered");
                vacant.insert(Arc::new(config));
                Ok(())
            }
        }
    }

    /// Return the binding for `service`/`element`, if any.
    #[must_use]
    pub fn get(&self, service: ServiceId, element: MethodId) -> Option<Arc<E2eConfig>> {
        self.bindings
            .get(&(service, element))
            .map(|binding| Arc::clone(binding.value()))
    }

    /// Check a received payload against the binding for its header's element.
    ///
    /// Returns [`CheckOutcome::NotChecked`] when the element has no binding.
    /// For profile 4 a payload whose CRC verifies also updates the element's
    /// counter; the first counter seen is accepted, later ones must advance by
    /// `1..=max_delta_counter` modulo 2^16.
    ///
    /// # Examples
    ///
    /// ```
    /// use bytes::Bytes;
    /// use someip_wire::e2e::{CheckOutcome, E2eConfig, E2eRegistry, P04Config, protect};
    /// use someip_wire::message::{Header, MessageKind, MethodId, ServiceId};
    ///
    /// let header = Header::new(ServiceId::new(0x1234), MethodId::new(0x8001), MessageKind::Notification.into());
    /// let config = E2eConfig::P04(P04Config::new(0x0100_002D));
    /// let registry = E2eRegistry::new();
    /// registry.register(header.service, header.method, config).expect("valid layout");
    ///
    /// let first = protect(&config, &header, Bytes::from(vec![0; 16]), 7).expect("payload fits");
    /// assert_eq!(registry.verify(&header, &first), CheckOutcome::Valid { counter: Some(7) });
    /// assert_eq!(registry.verify(&header, &first), CheckOutcome::WrongSequence { counter: 7 });
    /// ```
    #[must_use]
    pub fn verify(&self, header: &Header, payload: &[u8]) -> CheckOutcome {
        let key = (header.service, header.method);
        let Some(config) = self.get(key.0, key.1) else {
            return CheckOutcome::NotChecked;
        };
        let outcome = super::check(&config, header, payload);
        match (*config, outcome) {
            (E2eConfig::P04(profile), CheckOutcome::Valid { counter: Some(counter) }) => {
                self.track(key, counter, profile.max_delta_counter)
            }
            _ => outcome,
        }
    }

    fn track(&self, key: (ServiceId, MethodId), counter: u16, max_delta: u16) -> CheckOutcome {
        match self.last_counters.entry(key) {
            Entry::Vacant(vacant) => {
                vacant.insert(counter);
            }
            Entry::Occupied(mut occupied) => {
                let delta = counter.wrapping_sub(occupied.insert(counter));
                if !(1..=max_delta).contains(&delta) {
                    return CheckOutcome::WrongSequence { counter };
                }
            }
        }
        CheckOutcome::Valid {
            counter: Some(counter),
        }
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize { self.bindings.len() }

    /// Report whether no binding is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.bindings.is_empty() }
}

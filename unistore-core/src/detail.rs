//! Services that watch one derived property of the state
//!
//! A [`Detail`] reads a property from the state; [`DetailService`] samples it
//! before and after each action (or each drain) and calls
//! [`Detail::property_did_change`] only when the value differs.
//!
//! # Example
//!
//! ```
//! use unistore_core::detail::{Detail, DetailService, PropertyEvents};
//! use unistore_core::inject::{Injectable, Injector};
//! use unistore_core::{Store, StoreRef};
//!
//! #[derive(Default)]
//! struct Cart { items: Vec<u32> }
//!
//! #[derive(Default)]
//! struct TotalWatcher { changes: Vec<(u32, u32)> }
//!
//! impl Injectable for TotalWatcher {
//!     fn inject(&self, _injector: &mut Injector<'_>) {}
//! }
//!
//! impl Detail<Cart> for TotalWatcher {
//!     type Property = u32;
//!
//!     fn read_detail(&self, cart: &Cart) -> u32 {
//!         cart.items.iter().sum()
//!     }
//!
//!     fn property_did_change(&mut self, old: &u32, new: &u32, _store: &StoreRef<Cart>) {
//!         self.changes.push((*old, *new));
//!     }
//! }
//!
//! let store: Store<Cart> = Store::new(
//!     Cart::default(),
//!     vec![Box::new(DetailService::new(TotalWatcher::default()))],
//! );
//! store.send(|c: &mut Cart| { c.items.push(5); None });
//! ```

use std::fmt;

use crate::handle::StoreRef;
use crate::inject::{Injectable, Injector};
use crate::service::{Service, StoreSlot};

/// When a [`DetailService`] samples its property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyEvents {
    /// Before and after every action
    PerAction,
    /// Before the first and after the last action of a drain
    #[default]
    PerDispatch,
}

/// A derived property of `S` and the reaction to it changing
pub trait Detail<S, C = ()>: Injectable {
    /// The watched value
    type Property: PartialEq;

    /// Sampling granularity
    fn observed_events(&self) -> PropertyEvents {
        PropertyEvents::PerDispatch
    }

    /// Derive the property from the state
    fn read_detail(&self, state: &S) -> Self::Property;

    /// Called with the values before and after, only when they differ
    fn property_did_change(
        &mut self,
        old: &Self::Property,
        new: &Self::Property,
        store: &StoreRef<S, C>,
    );
}

/// Adapts a [`Detail`] into a [`Service`]
pub struct DetailService<D, S, C = ()>
where
    D: Detail<S, C>,
{
    detail: D,
    store: StoreSlot<S, C>,
    old_value: Option<D::Property>,
}

impl<D, S, C> DetailService<D, S, C>
where
    D: Detail<S, C>,
    S: 'static,
    C: 'static,
{
    /// Wrap `detail`
    pub fn new(detail: D) -> Self {
        Self {
            detail,
            store: StoreSlot::new(),
            old_value: None,
        }
    }

    /// The wrapped detail
    pub fn detail(&self) -> &D {
        &self.detail
    }

    fn sample(&self) -> Option<D::Property> {
        let detail = &self.detail;
        self.store
            .try_get()?
            .with_state(|state| detail.read_detail(state))
    }

    fn begin(&mut self, events: PropertyEvents) {
        if self.detail.observed_events() == events {
            self.old_value = self.sample();
        }
    }

    fn finish(&mut self, events: PropertyEvents) {
        if self.detail.observed_events() != events {
            return;
        }
        let Some(old) = self.old_value.take() else {
            return;
        };
        let Some(new) = self.sample() else {
            return;
        };
        if new != old {
            if let Some(store) = self.store.try_get() {
                self.detail.property_did_change(&old, &new, store);
            }
        }
    }
}

impl<D, S, C> fmt::Debug for DetailService<D, S, C>
where
    D: Detail<S, C> + fmt::Debug,
    D::Property: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailService")
            .field("detail", &self.detail)
            .field("old_value", &self.old_value)
            .finish()
    }
}

impl<D, S, C> Injectable for DetailService<D, S, C>
where
    D: Detail<S, C> + 'static,
{
    fn inject(&self, injector: &mut Injector<'_>) {
        injector.descend(&self.detail);
    }
}

impl<D, S, C> Service<S, C> for DetailService<D, S, C>
where
    D: Detail<S, C> + 'static,
    S: 'static,
    C: 'static,
{
    fn attach(&mut self, store: StoreRef<S, C>) {
        self.store.attach(store);
    }

    fn app_will_dispatch(&mut self) {
        self.begin(PropertyEvents::PerDispatch);
    }

    fn app_will_run_action(&mut self) {
        self.begin(PropertyEvents::PerAction);
    }

    fn run(&mut self, _command: Option<&C>) {
        self.finish(PropertyEvents::PerAction);
    }

    fn app_did_dispatch(&mut self) {
        self.finish(PropertyEvents::PerDispatch);
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<D>()
    }
}

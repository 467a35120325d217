/// Type-state markers for the builder pattern
///
/// These types track which required fields have been set in the builder at
/// compile time.
use std::marker::PhantomData;

/// Marker trait for URL state
pub trait UrlState {}

/// URL has not been set
pub struct NoUrl;
impl UrlState for NoUrl {}

/// URL has been set
pub struct HasUrl;
impl UrlState for HasUrl {}

/// Marker trait for frame handler state
pub trait HandlerState {}

/// Handler has not been set
pub struct NoHandler;
impl HandlerState for NoHandler {}

/// Handler has been set
pub struct HasHandler;
impl HandlerState for HasHandler {}

/// Phantom marker to prevent direct construction
#[derive(Debug, Clone, Copy)]
pub struct TypeState<U, H> {
    _url: PhantomData<U>,
    _handler: PhantomData<H>,
}

impl<U, H> TypeState<U, H> {
    pub(crate) fn new() -> Self {
        Self {
            _url: PhantomData,
            _handler: PhantomData,
        }
    }
}

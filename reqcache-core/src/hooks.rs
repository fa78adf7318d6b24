//! Storage-path body transforms.
//!
//! Hooks run in order over the fully buffered body right before an entry is
//! persisted; compression is the typical use. They never touch the body
//! delivered to the caller, and a hook failure aborts the write (reported as
//! a cache error) without affecting the primary response.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use smol_str::SmolStr;

use crate::BoxError;

/// A byte-level body transform.
pub trait BodyTransform: Send + Sync {
    /// Transforms the buffered body, returning the bytes to persist.
    fn apply(&self, body: Bytes) -> Result<Bytes, BoxError>;
}

impl<F> BodyTransform for F
where
    F: Fn(Bytes) -> Result<Bytes, BoxError> + Send + Sync,
{
    fn apply(&self, body: Bytes) -> Result<Bytes, BoxError> {
        self(body)
    }
}

/// A named, ordered storage-path transform.
#[derive(Clone)]
pub struct Hook {
    name: SmolStr,
    transform: Arc<dyn BodyTransform>,
}

impl Hook {
    /// Creates a named hook from any [`BodyTransform`].
    pub fn new(name: &str, transform: impl BodyTransform + 'static) -> Self {
        Hook {
            name: SmolStr::new(name),
            transform: Arc::new(transform),
        }
    }

    /// The hook's name, used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Applies the transform.
    pub fn apply(&self, body: Bytes) -> Result<Bytes, BoxError> {
        self.transform.apply(body)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_hooks_apply_in_order() {
        let upper = Hook::new("upper", |body: Bytes| {
            Ok(Bytes::from(body.to_ascii_uppercase()))
        });
        let reverse = Hook::new("reverse", |body: Bytes| {
            let mut bytes = body.to_vec();
            bytes.reverse();
            Ok(Bytes::from(bytes))
        });

        let mut body = Bytes::from_static(b"abc");
        for hook in [&upper, &reverse] {
            body = hook.apply(body).unwrap();
        }
        assert_eq!(body, Bytes::from_static(b"CBA"));
    }
}

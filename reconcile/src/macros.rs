//! Shorthands for building and returning [`crate::error::ReconcileError`] values.

/// Creates a [`crate::error::ReconcileError`] from a kind and a static description.
///
/// Accepts an optional detail (`detail = owned` moves a [`String`], a bare expression is
/// rendered with `to_string`) and an optional `source:` error.
#[macro_export]
macro_rules! reconcile_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::ReconcileError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::ReconcileError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        $crate::error::ReconcileError::from(($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr, source: $source:expr) => {
        $crate::error::ReconcileError::from(($kind, $desc, $detail)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::ReconcileError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::ReconcileError::from(($kind, $desc, $detail.to_string()))
            .with_source($source)
    };
}

/// Returns early with a [`crate::error::ReconcileError`].
///
/// Takes the same arguments as [`reconcile_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::reconcile_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::reconcile_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, detail = $detail:expr) => {
        return ::core::result::Result::Err($crate::reconcile_error!(
            $kind,
            $desc,
            detail = $detail
        ))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::reconcile_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::reconcile_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}

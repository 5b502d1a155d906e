//! Carrier adapters.
//!
//! | Adapter | Transport | Auth |
//! |---------|-----------|------|
//! | [`CanparAdapter`] | SOAP/XML | credentials inside the envelope |
//! | [`EShipPlusAdapter`] | REST/JSON | `eShipPlusAuth` header |
//! | [`PolarisAdapter`] | REST/JSON | `APIKey` query parameter |

pub mod canpar;
pub mod common;
pub mod eshipplus;
pub mod polaris;

pub use canpar::CanparAdapter;
pub use eshipplus::EShipPlusAdapter;
pub use polaris::PolarisAdapter;

//! Integration flows across shared-bus, bridge-correlator and bridge-runtime

pub mod launcher;

mod flows;

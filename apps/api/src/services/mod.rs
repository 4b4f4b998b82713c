//! Orchestration that spans several repositories. Route handlers stay
//! thin; anything touching more than one table in sequence lives here.

pub mod checkout;

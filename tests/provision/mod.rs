//! Provisioning pipeline scenarios driven by the scripted provider.

mod bdd_steps;
mod scenarios;
mod test_helpers;

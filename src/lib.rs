//! Dockyard Leads: contact-form lead intake for the company site.

pub mod config;
pub mod error;
pub mod intake;
pub mod leads;
pub mod notify;
pub mod web;

//! Invoice payload assembly and the generate workflow around it.

mod assembler;
mod service;

pub use assembler::{InvoiceAssembler, SHIPPING_DESCRIPTION};
pub use service::{InvoiceService, Trigger};

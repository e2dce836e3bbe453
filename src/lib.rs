//! Automatic driver-enable for a half-duplex RS-485 transceiver.
//!
//! The TX line of a UART is watched for start bits. Each falling edge turns
//! the transceiver's driver on for the time one byte takes at the bit rate
//! selected with a trimpot, and lights an LED a little longer as a visible
//! activity indicator.
#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod drivers;
pub mod os;

#[cfg(target_arch = "avr")]
pub mod hal;

#[cfg(not(target_arch = "avr"))]
pub mod sim;

//! Test utilities for Grapple.
//!
//! This crate provides testing infrastructure for hosts and plugins built on
//! the Grapple kernel.
//!
//! # Overview
//!
//! - [`MockElement`] - Recording implementation of the host `Element` trait
//! - [`ElementCall`] - One recorded element side effect
//!
//! # Example
//!
//! ```rust
//! use grapple_core::{Element, Rect, Vec2};
//! use grapple_test_utils::{ElementCall, MockElement};
//!
//! let mock = MockElement::new("card", Rect::new(0.0, 0.0, 50.0, 50.0));
//! let element = mock.as_element();
//!
//! element.set_translation(Some(Vec2::new(10.0, 0.0)));
//!
//! assert_eq!(mock.rect(), Rect::new(10.0, 0.0, 50.0, 50.0));
//! assert_eq!(
//!     mock.calls(),
//!     vec![ElementCall::SetTranslation(Some(Vec2::new(10.0, 0.0)))]
//! );
//! ```
//!
//! # Design Philosophy
//!
//! Mocks are handed out as `Arc<MockElement>` so a test can keep inspecting
//! the same object it gave to the kernel as an `ElementRef`.

pub mod mock_element;

pub use mock_element::{ElementCall, MockElement};

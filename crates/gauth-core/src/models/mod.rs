// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persisted domain records and their input types.

mod policy;
mod role;
mod session;
mod user;

pub use policy::{NewPolicy, Policy, PolicyEffect};
pub use role::{NewRole, RoleRecord};
pub use session::{NewSession, Session};
pub use user::{NewUser, User, UserChanges, UserPage, UserQuery, UserWithRoles};

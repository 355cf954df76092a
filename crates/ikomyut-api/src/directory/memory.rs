//! In-memory directory of users and verified contacts.

use super::{Contact, User};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// In-memory user and contact directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Directory {
    /// Users indexed by normalized mobile number
    users: HashMap<String, User>,

    /// Verified contact messages in arrival order
    #[serde(default)]
    contacts: Vec<Contact>,
}

impl Directory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a user by mobile number.
    pub fn find_user_by_mobile(&self, mobile_no: &str) -> Option<&User> {
        self.users.get(mobile_no)
    }

    /// Check if a mobile number belongs to a user.
    pub fn is_mobile_registered(&self, mobile_no: &str) -> bool {
        self.users.contains_key(mobile_no)
    }

    /// Check that neither the mobile number nor the email is taken.
    ///
    /// When one existing user holds the email, that conflict is reported
    /// ahead of the mobile number.
    pub fn check_available(&self, mobile_no: &str, email: &str) -> Result<(), ApiError> {
        let existing = self
            .users
            .get(mobile_no)
            .or_else(|| self.find_user_by_email(email));

        match existing {
            Some(user) if user.email.eq_ignore_ascii_case(email) => {
                Err(ApiError::EmailAlreadyRegistered)
            }
            Some(_) => Err(ApiError::MobileAlreadyRegistered),
            None => Ok(()),
        }
    }

    /// Insert a user after checking both unique keys.
    pub fn insert_user(&mut self, user: User) -> Result<(), ApiError> {
        self.check_available(&user.mobile_no, &user.email)?;
        self.users.insert(user.mobile_no.clone(), user);
        Ok(())
    }

    /// Remove a user by mobile number.
    pub fn remove_user(&mut self, mobile_no: &str) -> Option<User> {
        self.users.remove(mobile_no)
    }

    /// Append a verified contact message.
    pub fn insert_contact(&mut self, contact: Contact) {
        self.contacts.push(contact);
    }

    /// Remove a contact message by id.
    pub fn remove_contact(&mut self, id: Uuid) -> Option<Contact> {
        let index = self.contacts.iter().position(|c| c.id == id)?;
        Some(self.contacts.remove(index))
    }

    /// All verified contact messages.
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Number of verified contact messages.
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    fn find_user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
    }
}

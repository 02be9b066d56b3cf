//! In-process collaborator implementations backed by plain vectors

use crate::models::{Contact, EmojiPackage};

use super::{ContactDirectory, EmojiIndexSource};

/// Emoji packages held in memory
#[derive(Debug, Clone, Default)]
pub struct EmojiCatalog {
    packages: Vec<EmojiPackage>,
    revision: u64,
}

impl EmojiCatalog {
    /// Create a catalog from packages
    pub fn new(packages: Vec<EmojiPackage>) -> Self {
        Self {
            packages,
            revision: 1,
        }
    }

    /// Replace the package list
    pub fn replace(&mut self, packages: Vec<EmojiPackage>) {
        self.packages = packages;
        self.revision += 1;
    }

    /// Add one package
    pub fn add(&mut self, package: EmojiPackage) {
        self.packages.push(package);
        self.revision += 1;
    }
}

impl EmojiIndexSource for EmojiCatalog {
    fn packages(&self) -> Vec<EmojiPackage> {
        self.packages.clone()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

/// Contacts held in memory
#[derive(Debug, Clone, Default)]
pub struct ContactList {
    contacts: Vec<Contact>,
    revision: u64,
}

impl ContactList {
    /// Create a list from contacts
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self {
            contacts,
            revision: 1,
        }
    }

    /// Replace the contact list
    pub fn replace(&mut self, contacts: Vec<Contact>) {
        self.contacts = contacts;
        self.revision += 1;
    }
}

impl ContactDirectory for ContactList {
    fn contacts(&self) -> Vec<Contact> {
        self.contacts.clone()
    }

    fn revision(&self) -> u64 {
        self.revision
    }
}

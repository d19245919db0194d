//! Provider operation kinds.

use std::fmt;

/// The uniform CRUD operations exposed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `getList`
    GetList,
    /// `getOne`
    GetOne,
    /// `getMany`
    GetMany,
    /// `getManyReference`
    GetManyReference,
    /// `create`
    Create,
    /// `update`
    Update,
    /// `updateMany`
    UpdateMany,
    /// `delete`
    Delete,
    /// `deleteMany`
    DeleteMany,
}

impl Operation {
    /// All operations.
    pub const ALL: [Operation; 9] = [
        Operation::GetList,
        Operation::GetOne,
        Operation::GetMany,
        Operation::GetManyReference,
        Operation::Create,
        Operation::Update,
        Operation::UpdateMany,
        Operation::Delete,
        Operation::DeleteMany,
    ];

    /// Returns `true` for operations returning a page of records with a total.
    pub fn is_listing(&self) -> bool {
        matches!(self, Operation::GetList | Operation::GetManyReference)
    }

    /// Returns `true` for operations that modify data.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Create
                | Operation::Update
                | Operation::UpdateMany
                | Operation::Delete
                | Operation::DeleteMany
        )
    }

    /// The data provider method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetList => "getList",
            Operation::GetOne => "getOne",
            Operation::GetMany => "getMany",
            Operation::GetManyReference => "getManyReference",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::UpdateMany => "updateMany",
            Operation::Delete => "delete",
            Operation::DeleteMany => "deleteMany",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_and_write_are_disjoint() {
        for op in Operation::ALL {
            assert!(!(op.is_listing() && op.is_write()), "{op}");
        }
        assert!(Operation::GetManyReference.is_listing());
        assert!(Operation::DeleteMany.is_write());
        assert!(!Operation::GetOne.is_write());
    }
}

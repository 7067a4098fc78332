//! Common B-tree node header shared by leaf and internal pages.
//!
//! Every page that is part of the tree starts with:
//! - `node_type`: 1 byte (0 = internal, 1 = leaf)
//! - `is_root`: 1 byte (0 or 1)
//! - `parent`: 4 bytes (page number of the parent internal node)
//!
//! Total: 6 bytes

use crate::storage::page::{Page, PageNum};

pub const NODE_TYPE_SIZE: usize = std::mem::size_of::<u8>();
pub const NODE_TYPE_OFFSET: usize = 0;
pub const IS_ROOT_SIZE: usize = std::mem::size_of::<u8>();
pub const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
pub const PARENT_POINTER_SIZE: usize = std::mem::size_of::<u32>();
pub const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
pub const COMMON_NODE_HEADER_SIZE: usize = NODE_TYPE_SIZE + IS_ROOT_SIZE + PARENT_POINTER_SIZE;

/// Node type discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeType {
    Internal = 0,
    Leaf = 1,
}

impl TryFrom<u8> for NodeType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Internal),
            1 => Ok(Self::Leaf),
            _ => Err(value),
        }
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Internal => write!(f, "internal"),
            Self::Leaf => write!(f, "leaf"),
        }
    }
}

/// Decoded common header of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    pub node_type: NodeType,
    pub is_root: bool,
    pub parent: PageNum,
}

impl NodeHeader {
    /// Read a node header from a page.
    pub fn from_page(page: &Page) -> Result<Self, NodeError> {
        Ok(Self {
            node_type: node_type(page)?,
            is_root: is_root(page),
            parent: parent(page),
        })
    }

    /// Write a node header to a page.
    pub fn write_to_page(&self, page: &mut Page) {
        set_node_type(page, self.node_type);
        set_root(page, self.is_root);
        set_parent(page, self.parent);
    }
}

pub fn node_type(page: &Page) -> Result<NodeType, NodeError> {
    NodeType::try_from(page.read_u8(NODE_TYPE_OFFSET)).map_err(NodeError::InvalidNodeType)
}

pub fn set_node_type(page: &mut Page, node_type: NodeType) {
    page.write_u8(NODE_TYPE_OFFSET, node_type as u8);
}

#[must_use]
pub fn is_root(page: &Page) -> bool {
    page.read_u8(IS_ROOT_OFFSET) != 0
}

pub fn set_root(page: &mut Page, is_root: bool) {
    page.write_u8(IS_ROOT_OFFSET, u8::from(is_root));
}

#[must_use]
pub fn parent(page: &Page) -> PageNum {
    page.read_u32(PARENT_POINTER_OFFSET)
}

pub fn set_parent(page: &mut Page, parent: PageNum) {
    page.write_u32(PARENT_POINTER_OFFSET, parent);
}

/// Errors that can occur when interpreting a page as a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node type byte is neither internal nor leaf.
    InvalidNodeType(u8),
    /// A cell index (or a stored count) is past the node's capacity.
    CellOutOfBounds { index: u32, capacity: usize },
    /// A node with no cells where at least one is required.
    EmptyNode(PageNum),
    /// A parent pointer names a node that does not list the child.
    MissingChild { parent: PageNum, child: PageNum },
    /// Following child or parent links came back around to a page already
    /// on the path, or took more steps than the table has pages.
    Cycle { page: PageNum },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNodeType(v) => write!(f, "invalid node type: 0x{v:02x}"),
            Self::CellOutOfBounds { index, capacity } => {
                write!(f, "cell {index} out of bounds (capacity: {capacity})")
            }
            Self::EmptyNode(page_num) => write!(f, "node on page {page_num} has no cells"),
            Self::MissingChild { parent, child } => {
                write!(f, "page {parent} is not the parent of page {child}")
            }
            Self::Cycle { page } => write!(f, "page links loop through page {page}"),
        }
    }
}

impl std::error::Error for NodeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        assert_eq!(COMMON_NODE_HEADER_SIZE, 6);
        assert_eq!(PARENT_POINTER_OFFSET, 2);
    }

    #[test]
    fn test_header_roundtrip() {
        let mut page = Page::new();
        let header = NodeHeader {
            node_type: NodeType::Internal,
            is_root: true,
            parent: 9,
        };
        header.write_to_page(&mut page);

        assert_eq!(page.read_u8(0), 0);
        assert_eq!(page.read_u8(1), 1);
        assert_eq!(page.read_u32(2), 9);
        assert_eq!(NodeHeader::from_page(&page), Ok(header));
    }

    #[test]
    fn test_invalid_node_type() {
        let mut page = Page::new();
        page.write_u8(NODE_TYPE_OFFSET, 7);
        assert_eq!(node_type(&page), Err(NodeError::InvalidNodeType(7)));
    }

    #[test]
    fn test_root_flag_toggle() {
        let mut page = Page::new();
        assert!(!is_root(&page));
        set_root(&mut page, true);
        assert!(is_root(&page));
        set_root(&mut page, false);
        assert!(!is_root(&page));
    }
}

//! Block tree of a FIF file.
//!
//! The flat tag directory is folded into nested [`Node`]s at every
//! `FIFF_BLOCK_START` / `FIFF_BLOCK_END` pair, like `mne._fiff.tree.make_dir_tree`.
use std::io::{Read, Seek};
use anyhow::Result;

use super::constants::*;
use super::tag::{read_directory, read_i32, read_tag_header, TagHeader};

/// One block of the file.  The root node has `block == 0`.
#[derive(Debug, Default, Clone)]
pub struct Node {
    pub block:    i32,
    /// Tags directly inside this block, block delimiters excluded.
    pub entries:  Vec<TagHeader>,
    pub children: Vec<Node>,
}

impl Node {
    /// Depth-first search for the first block of `kind`, `self` included.
    pub fn find_block(&self, kind: i32) -> Option<&Node> {
        if self.block == kind {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_block(kind))
    }

    /// First entry of `kind` in this block (children are not searched).
    pub fn find_tag(&self, kind: i32) -> Option<&TagHeader> {
        self.entries.iter().find(|e| e.kind == kind)
    }
}

/// Fold `directory` into a tree, asking `block_kind` for the kind of each
/// `FIFF_BLOCK_START` tag.
fn assemble<F>(directory: &[TagHeader], mut block_kind: F) -> Result<Node>
where
    F: FnMut(&TagHeader) -> Result<i32>,
{
    let mut stack: Vec<Node> = vec![Node::default()];
    for tag in directory {
        match tag.kind {
            FIFF_BLOCK_START => {
                let block = block_kind(tag)?;
                stack.push(Node { block, ..Node::default() });
            }
            FIFF_BLOCK_END if stack.len() > 1 => {
                if let Some(done) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(done);
                    }
                }
            }
            FIFF_BLOCK_END => {}
            _ => {
                if let Some(node) = stack.last_mut() {
                    node.entries.push(*tag);
                }
            }
        }
    }
    // Unterminated blocks are attached to their parents.
    while stack.len() > 1 {
        if let Some(orphan) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.children.push(orphan);
            }
        }
    }
    Ok(stack.pop().unwrap_or_default())
}

/// Build the tree, reading each block kind from the file.
pub fn read_tree<R: Read + Seek>(reader: &mut R, directory: &[TagHeader]) -> Result<Node> {
    assemble(directory, |tag| read_i32(reader, tag))
}

/// Collect every tag header by following the `next` chain from offset 0.
pub fn scan_directory<R: Read + Seek>(reader: &mut R) -> Result<Vec<TagHeader>> {
    let mut directory = Vec::new();
    let mut pos = Some(0);
    while let Some(p) = pos {
        let tag = read_tag_header(reader, p)?;
        pos = tag.next_pos();
        directory.push(tag);
    }
    Ok(directory)
}

/// Load the embedded directory referenced by the second tag
/// (`FIFF_DIR_POINTER`).  `None` when the file has no usable directory,
/// which is the case for files written by this crate.
pub fn try_load_directory<R: Read + Seek>(reader: &mut R) -> Result<Option<Vec<TagHeader>>> {
    let id_tag = read_tag_header(reader, 0)?;
    if id_tag.kind != FIFF_FILE_ID {
        return Ok(None);
    }
    let Some(next) = id_tag.next_pos() else { return Ok(None) };
    let dir_ptr = read_tag_header(reader, next)?;
    if dir_ptr.kind != FIFF_DIR_POINTER {
        return Ok(None);
    }
    let dirpos = read_i32(reader, &dir_ptr)?;
    if dirpos <= 0 {
        return Ok(None);
    }
    let dir_tag = read_tag_header(reader, dirpos as u64)?;
    if dir_tag.ftype != FIFFT_DIR_ENTRY_STRUCT {
        return Ok(None);
    }
    Ok(Some(read_directory(reader, &dir_tag)?))
}

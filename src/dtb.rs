//! Devicetree decode for reboot mode properties.
//!
//! Hosts that discover their mode table from an FDT node can feed
//! [`mode_properties`] straight into table construction; everything else
//! in the crate stays schema-agnostic.

use fdt::node::FdtNode;

use crate::table::ModeProperty;

/// Decodes a node's properties into the shape table construction
/// consumes. Property values are big-endian u32 cells; the first cell is
/// the low half of the magic, an optional second cell the high half.
/// Prefix filtering is left to the table builder.
pub fn mode_properties<'b, 'a>(node: FdtNode<'b, 'a>) -> impl Iterator<Item = ModeProperty<'a>> {
    node.properties().map(|prop| {
        let (low, high) = magic_cells(prop.value);
        ModeProperty {
            name: prop.name,
            low,
            high,
        }
    })
}

fn magic_cells(value: &[u8]) -> (Option<u32>, Option<u32>) {
    let mut cells = value
        .chunks_exact(4)
        .map(|cell| u32::from_be_bytes([cell[0], cell[1], cell[2], cell[3]]));
    (cells.next(), cells.next())
}

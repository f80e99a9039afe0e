//! FlatBuffers tables of `schema/graph.fbs`.
//!
//! Laid out the way `flatc --rust` emits them: a zero-copy accessor struct,
//! an `Args` struct and a builder per table.

#![allow(clippy::needless_lifetimes, clippy::extra_unused_lifetimes)]

use flatbuffers::{
    Allocator, FlatBufferBuilder, Follow, ForwardsUOffset, InvalidFlatbuffer, Table,
    TableUnfinishedWIPOffset, VOffsetT, Verifiable, Vector, Verifier, VerifierOptions, WIPOffset,
};

// CumulativeMeasure

#[derive(Copy, Clone, PartialEq)]
pub struct CumulativeMeasure<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for CumulativeMeasure<'a> {
    type Inner = CumulativeMeasure<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: unsafe { Table::new(buf, loc) },
        }
    }
}

impl<'a> CumulativeMeasure<'a> {
    pub const VT_CUMULATIVE_DISTANCE: VOffsetT = 4;
    pub const VT_CUMULATIVE_GAIN: VOffsetT = 6;
    pub const VT_CUMULATIVE_LOSS: VOffsetT = 8;

    pub fn create<'bldr: 'args, 'args: 'mut_bldr, 'mut_bldr, A: Allocator + 'bldr>(
        fbb: &'mut_bldr mut FlatBufferBuilder<'bldr, A>,
        args: &'args CumulativeMeasureArgs,
    ) -> WIPOffset<CumulativeMeasure<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<f64>(Self::VT_CUMULATIVE_LOSS, args.cumulative_loss, 0.0);
        fbb.push_slot::<f64>(Self::VT_CUMULATIVE_GAIN, args.cumulative_gain, 0.0);
        fbb.push_slot::<f64>(Self::VT_CUMULATIVE_DISTANCE, args.cumulative_distance, 0.0);
        finish_table(fbb, start)
    }

    #[inline]
    pub fn cumulative_distance(&self) -> f64 {
        // Safety: created from a verified table
        unsafe { self._tab.get::<f64>(Self::VT_CUMULATIVE_DISTANCE, Some(0.0)) }.unwrap_or(0.0)
    }

    #[inline]
    pub fn cumulative_gain(&self) -> f64 {
        unsafe { self._tab.get::<f64>(Self::VT_CUMULATIVE_GAIN, Some(0.0)) }.unwrap_or(0.0)
    }

    #[inline]
    pub fn cumulative_loss(&self) -> f64 {
        unsafe { self._tab.get::<f64>(Self::VT_CUMULATIVE_LOSS, Some(0.0)) }.unwrap_or(0.0)
    }
}

impl Verifiable for CumulativeMeasure<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<f64>("cumulative_distance", Self::VT_CUMULATIVE_DISTANCE, false)?
            .visit_field::<f64>("cumulative_gain", Self::VT_CUMULATIVE_GAIN, false)?
            .visit_field::<f64>("cumulative_loss", Self::VT_CUMULATIVE_LOSS, false)?
            .finish();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CumulativeMeasureArgs {
    pub cumulative_distance: f64,
    pub cumulative_gain: f64,
    pub cumulative_loss: f64,
}

// Node

#[derive(Copy, Clone, PartialEq)]
pub struct Node<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Node<'a> {
    type Inner = Node<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: unsafe { Table::new(buf, loc) },
        }
    }
}

impl<'a> Node<'a> {
    pub const VT_ID: VOffsetT = 4;
    pub const VT_X: VOffsetT = 6;
    pub const VT_Y: VOffsetT = 8;
    pub const VT_Z: VOffsetT = 10;

    pub fn create<'bldr: 'args, 'args: 'mut_bldr, 'mut_bldr, A: Allocator + 'bldr>(
        fbb: &'mut_bldr mut FlatBufferBuilder<'bldr, A>,
        args: &'args NodeArgs,
    ) -> WIPOffset<Node<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<f64>(Self::VT_Z, args.z, 0.0);
        fbb.push_slot::<f64>(Self::VT_Y, args.y, 0.0);
        fbb.push_slot::<f64>(Self::VT_X, args.x, 0.0);
        fbb.push_slot::<u32>(Self::VT_ID, args.id, 0);
        finish_table(fbb, start)
    }

    #[inline]
    pub fn id(&self) -> u32 {
        unsafe { self._tab.get::<u32>(Self::VT_ID, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        unsafe { self._tab.get::<f64>(Self::VT_X, Some(0.0)) }.unwrap_or(0.0)
    }

    #[inline]
    pub fn y(&self) -> f64 {
        unsafe { self._tab.get::<f64>(Self::VT_Y, Some(0.0)) }.unwrap_or(0.0)
    }

    #[inline]
    pub fn z(&self) -> f64 {
        unsafe { self._tab.get::<f64>(Self::VT_Z, Some(0.0)) }.unwrap_or(0.0)
    }
}

impl Verifiable for Node<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("id", Self::VT_ID, false)?
            .visit_field::<f64>("x", Self::VT_X, false)?
            .visit_field::<f64>("y", Self::VT_Y, false)?
            .visit_field::<f64>("z", Self::VT_Z, false)?
            .finish();
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeArgs {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

// Edge

pub type MeasureVector<'a> = Vector<'a, ForwardsUOffset<CumulativeMeasure<'a>>>;

#[derive(Copy, Clone, PartialEq)]
pub struct Edge<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Edge<'a> {
    type Inner = Edge<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: unsafe { Table::new(buf, loc) },
        }
    }
}

impl<'a> Edge<'a> {
    pub const VT_START_NODE_ID: VOffsetT = 4;
    pub const VT_END_NODE_ID: VOffsetT = 6;
    pub const VT_WEIGHT: VOffsetT = 8;
    pub const VT_GEOMETRY_WKB: VOffsetT = 10;
    pub const VT_MEASURES_FORWARD: VOffsetT = 12;
    pub const VT_MEASURES_REVERSE: VOffsetT = 14;

    pub fn create<'bldr: 'args, 'args: 'mut_bldr, 'mut_bldr, A: Allocator + 'bldr>(
        fbb: &'mut_bldr mut FlatBufferBuilder<'bldr, A>,
        args: &'args EdgeArgs<'args>,
    ) -> WIPOffset<Edge<'bldr>> {
        let start = fbb.start_table();
        fbb.push_slot::<f64>(Self::VT_WEIGHT, args.weight, 0.0);
        if let Some(x) = args.measures_reverse {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_MEASURES_REVERSE, x);
        }
        if let Some(x) = args.measures_forward {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_MEASURES_FORWARD, x);
        }
        if let Some(x) = args.geometry_wkb {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_GEOMETRY_WKB, x);
        }
        fbb.push_slot::<u32>(Self::VT_END_NODE_ID, args.end_node_id, 0);
        fbb.push_slot::<u32>(Self::VT_START_NODE_ID, args.start_node_id, 0);
        finish_table(fbb, start)
    }

    #[inline]
    pub fn start_node_id(&self) -> u32 {
        unsafe { self._tab.get::<u32>(Self::VT_START_NODE_ID, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn end_node_id(&self) -> u32 {
        unsafe { self._tab.get::<u32>(Self::VT_END_NODE_ID, Some(0)) }.unwrap_or(0)
    }

    #[inline]
    pub fn weight(&self) -> f64 {
        unsafe { self._tab.get::<f64>(Self::VT_WEIGHT, Some(0.0)) }.unwrap_or(0.0)
    }

    #[inline]
    pub fn geometry_wkb(&self) -> Option<Vector<'a, u8>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, u8>>>(Self::VT_GEOMETRY_WKB, None)
        }
    }

    #[inline]
    pub fn measures_forward(&self) -> Option<MeasureVector<'a>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<MeasureVector<'a>>>(Self::VT_MEASURES_FORWARD, None)
        }
    }

    #[inline]
    pub fn measures_reverse(&self) -> Option<MeasureVector<'a>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<MeasureVector<'a>>>(Self::VT_MEASURES_REVERSE, None)
        }
    }
}

impl Verifiable for Edge<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("start_node_id", Self::VT_START_NODE_ID, false)?
            .visit_field::<u32>("end_node_id", Self::VT_END_NODE_ID, false)?
            .visit_field::<f64>("weight", Self::VT_WEIGHT, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, u8>>>(
                "geometry_wkb",
                Self::VT_GEOMETRY_WKB,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<CumulativeMeasure<'_>>>>>(
                "measures_forward",
                Self::VT_MEASURES_FORWARD,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<CumulativeMeasure<'_>>>>>(
                "measures_reverse",
                Self::VT_MEASURES_REVERSE,
                false,
            )?
            .finish();
        Ok(())
    }
}

#[derive(Default)]
pub struct EdgeArgs<'a> {
    pub start_node_id: u32,
    pub end_node_id: u32,
    pub weight: f64,
    pub geometry_wkb: Option<WIPOffset<Vector<'a, u8>>>,
    pub measures_forward: Option<WIPOffset<MeasureVector<'a>>>,
    pub measures_reverse: Option<WIPOffset<MeasureVector<'a>>>,
}

// Graph

#[derive(Copy, Clone, PartialEq)]
pub struct Graph<'a> {
    pub _tab: Table<'a>,
}

impl<'a> Follow<'a> for Graph<'a> {
    type Inner = Graph<'a>;
    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            _tab: unsafe { Table::new(buf, loc) },
        }
    }
}

impl<'a> Graph<'a> {
    pub const VT_NODES: VOffsetT = 4;
    pub const VT_EDGES: VOffsetT = 6;

    pub fn create<'bldr: 'args, 'args: 'mut_bldr, 'mut_bldr, A: Allocator + 'bldr>(
        fbb: &'mut_bldr mut FlatBufferBuilder<'bldr, A>,
        args: &'args GraphArgs<'args>,
    ) -> WIPOffset<Graph<'bldr>> {
        let start = fbb.start_table();
        if let Some(x) = args.edges {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_EDGES, x);
        }
        if let Some(x) = args.nodes {
            fbb.push_slot_always::<WIPOffset<_>>(Self::VT_NODES, x);
        }
        finish_table(fbb, start)
    }

    #[inline]
    pub fn nodes(&self) -> Option<Vector<'a, ForwardsUOffset<Node<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Node<'a>>>>>(Self::VT_NODES, None)
        }
    }

    #[inline]
    pub fn edges(&self) -> Option<Vector<'a, ForwardsUOffset<Edge<'a>>>> {
        unsafe {
            self._tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Edge<'a>>>>>(Self::VT_EDGES, None)
        }
    }
}

impl Verifiable for Graph<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Node<'_>>>>>(
                "nodes",
                Self::VT_NODES,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Edge<'_>>>>>(
                "edges",
                Self::VT_EDGES,
                false,
            )?
            .finish();
        Ok(())
    }
}

#[derive(Default)]
pub struct GraphArgs<'a> {
    pub nodes: Option<WIPOffset<Vector<'a, ForwardsUOffset<Node<'a>>>>>,
    pub edges: Option<WIPOffset<Vector<'a, ForwardsUOffset<Edge<'a>>>>>,
}

fn finish_table<'bldr, A: Allocator + 'bldr, T>(
    fbb: &mut FlatBufferBuilder<'bldr, A>,
    start: WIPOffset<TableUnfinishedWIPOffset>,
) -> WIPOffset<T> {
    let end = fbb.end_table(start);
    WIPOffset::new(end.value())
}

/// Verify `buf` and return its root graph table.
///
/// Graphs exceed the default verifier table budget easily, since every
/// cumulative measure is a table of its own.
pub fn root_as_graph(buf: &[u8]) -> Result<Graph<'_>, InvalidFlatbuffer> {
    let opts = VerifierOptions {
        max_tables: usize::MAX,
        max_apparent_size: usize::MAX,
        ..VerifierOptions::default()
    };
    flatbuffers::root_with_opts::<Graph<'_>>(&opts, buf)
}

//! Serial processing chain.
//!
//! [`AudioGraph`] is the library's one graph topology: an ordered list of
//! processors pulled in sequence through a single buffer. The first node
//! is a source and fills the buffer; every subsequent node transforms it
//! in place. Voices and the voice-manager sum handle the only parallel
//! structure in the engine, so no scheduler exists here.

use crate::buffer::AudioBuffer;
use crate::processor::Processor;

/// An ordered chain of processors sharing one block buffer.
pub struct AudioGraph {
    nodes: Vec<Box<dyn Processor + Send>>,
}

impl AudioGraph {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Appends a processor to the end of the chain.
    pub fn add_node(&mut self, node: Box<dyn Processor + Send>) {
        self.nodes.push(node);
    }

    /// Removes all nodes.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Number of nodes in the chain.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the chain has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for AudioGraph {
    fn pull(&mut self, output: &mut [f32]) {
        if self.nodes.is_empty() {
            output.fill(0.0);
            return;
        }
        for node in &mut self.nodes {
            node.pull(output);
        }
    }

    fn pull_stereo(&mut self, output: &mut AudioBuffer<'_>) {
        if self.nodes.is_empty() {
            output.clear();
            return;
        }
        for node in &mut self.nodes {
            node.pull_stereo(output);
        }
    }

    fn reset(&mut self) {
        for node in &mut self.nodes {
            node.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f32);

    impl Processor for Constant {
        fn pull(&mut self, output: &mut [f32]) {
            output.fill(self.0);
        }
        fn reset(&mut self) {}
    }

    struct Offset(f32);

    impl Processor for Offset {
        fn pull(&mut self, output: &mut [f32]) {
            for sample in output.iter_mut() {
                *sample += self.0;
            }
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn empty_graph_renders_silence() {
        let mut graph = AudioGraph::new();
        let mut buf = [1.0f32; 8];
        graph.pull(&mut buf);
        assert_eq!(buf, [0.0; 8]);
    }

    #[test]
    fn chain_runs_in_order() {
        let mut graph = AudioGraph::new();
        graph.add_node(Box::new(Constant(1.0)));
        graph.add_node(Box::new(Offset(0.5)));
        graph.add_node(Box::new(Offset(0.25)));

        let mut buf = [0.0f32; 4];
        graph.pull(&mut buf);
        assert_eq!(buf, [1.75; 4]);
    }

    #[test]
    fn stereo_pull_runs_all_nodes() {
        let mut graph = AudioGraph::new();
        graph.add_node(Box::new(Constant(0.5)));

        let mut left = [0.0f32; 4];
        let mut right = [0.0f32; 4];
        let mut buf = AudioBuffer::new(&mut left, &mut right);
        graph.pull_stereo(&mut buf);
        assert_eq!(left, [0.5; 4]);
        assert_eq!(right, [0.5; 4]);
    }

    #[test]
    fn clear_empties_the_chain() {
        let mut graph = AudioGraph::new();
        graph.add_node(Box::new(Constant(1.0)));
        assert_eq!(graph.len(), 1);
        graph.clear();
        assert!(graph.is_empty());
    }
}

//! Chunking Strategies Comparison
//!
//! Runs one document through every strategy, then through the fixed-window
//! fallback, and shows where each put its cuts.
//!
//! ```bash
//! cargo run --example chunking_strategies
//! ```

use strata::{
    Chunk, Chunker, Context, DocumentChunker, EngineConfig, FixedChunker, ProcessingOptions, Strategy,
};

fn preview(chunk: &Chunk, document: &str) -> String {
    let own = &document[chunk.span()];
    let head: String = own.chars().take(50).collect();
    head.replace('\n', " ")
}

fn main() {
    println!("Chunking Strategies");
    println!("===================\n");

    let document = r"Training a model involves three passes over the data. Each pass refines the weights a little further, and the loss curve shows how fast that happens.

Step 1: Forward pass. Input flows through the network, producing predictions.
Step 2: Loss computation. Predictions are compared against ground truth.
Step 3: Backpropagation. Gradients flow backward, updating weights.

Q: How many epochs are enough?
A: Stop when validation loss has not improved for several epochs in a row. Longer training tends to overfit.

A learning rate is the step size used when updating weights. Overfitting means the model memorizes noise instead of learning the signal. Warning: a learning rate that is too high makes the loss diverge.";

    println!("Document length: {} bytes\n", document.len());

    let chunker = DocumentChunker::new(EngineConfig::uncached()).expect("default config is valid");
    let ctx = Context {
        processing_options: ProcessingOptions {
            target_size: Some(250),
            max_size: Some(400),
            min_size: Some(100),
            ..ProcessingOptions::default()
        },
        ..Context::default()
    };

    for strategy in Strategy::ALL {
        let ctx = Context {
            processing_options: ProcessingOptions {
                strategy: Some(strategy.as_str().to_string()),
                ..ctx.processing_options.clone()
            },
            ..Context::default()
        };
        let result = chunker.chunk_document(Some(document), &ctx);
        println!(
            "{:<22} chunks: {}  relationships kept: {}  avg quality: {:.2}",
            strategy.as_str(),
            result.metadata.total_chunks,
            result.metadata.relationships_preserved,
            result.metadata.average_quality
        );
        for chunk in &result.chunks {
            println!(
                "    [{}] {:>4}..{:<4} \"{}...\"",
                chunk.index,
                chunk.start_position,
                chunk.end_position,
                preview(chunk, document)
            );
        }
    }

    let auto = chunker.chunk_document(Some(document), &ctx);
    println!("\nAuto-selected strategy: {}", auto.metadata.strategy);

    println!("\nFixed windows (the fallback)");
    for chunk in FixedChunker::no_overlap(250).chunk(document) {
        println!(
            "    [{}] {:>4}..{:<4} \"{}...\"",
            chunk.index,
            chunk.start_position,
            chunk.end_position,
            preview(&chunk, document)
        );
    }
    println!("\nNote: fixed windows cut mid-sentence; the pipeline cuts at sentence starts.");
}

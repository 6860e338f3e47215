use std::time::{Duration, Instant};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::{
    build_name,
    item::{ItemProcessor, ItemReader, ItemWriter},
};

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum StepStatus {
    Starting,
    Success,
    ReadError,
    ProcessorError,
    WriteError,
}

#[derive(Debug, PartialEq)]
enum ChunkStatus {
    Full,
    Finished,
}

/// Counters and timing of one step run.
#[derive(Debug)]
pub struct StepExecution {
    pub id: Uuid,
    pub name: String,
    pub status: StepStatus,
    pub start_time: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written
    pub write_count: usize,
    /// Number of items the reader could not produce
    pub read_error_count: usize,
    pub process_error_count: usize,
    pub write_error_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
            read_count: 0,
            write_count: 0,
            read_error_count: 0,
            process_error_count: 0,
            write_error_count: 0,
        }
    }
}

pub trait Step {
    fn get_name(&self) -> &str;

    /// Runs the step, recording progress into `step_execution`.
    ///
    /// Returns `Err(BatchError::Step)` when the skip limit was exceeded.
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;
}

/// Reads items one by one, processes them and writes them in chunks.
///
/// Failed items are skipped and counted until more than `skip_limit` of them
/// have been seen, at which point the step stops with an error status.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    reader: &'a dyn ItemReader<I>,
    processor: &'a dyn ItemProcessor<I, O>,
    writer: &'a dyn ItemWriter<O>,
    chunk_size: usize,
    skip_limit: usize,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        info!("Start of step: {}, id: {}", step_execution.name, step_execution.id);

        Self::manage_error(self.writer.open());

        loop {
            let (read_items, chunk_status) = match self.read_chunk(step_execution) {
                Ok(chunk) => chunk,
                Err(_) => {
                    step_execution.status = StepStatus::ReadError;
                    break;
                }
            };

            let processed_items = match self.process_chunk(step_execution, &read_items) {
                Ok(items) => items,
                Err(_) => {
                    step_execution.status = StepStatus::ProcessorError;
                    break;
                }
            };

            if self.write_chunk(step_execution, &processed_items).is_err() {
                step_execution.status = StepStatus::WriteError;
                break;
            }

            if chunk_status == ChunkStatus::Finished {
                step_execution.status = StepStatus::Success;
                break;
            }
        }

        Self::manage_error(self.writer.close());

        step_execution.start_time = start_time;
        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        info!(
            "End of step: {}, id: {}, status: {:?}",
            step_execution.name, step_execution.id, step_execution.status
        );

        if step_execution.status == StepStatus::Success {
            Ok(())
        } else {
            Err(BatchError::Step(step_execution.name.clone()))
        }
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Vec<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");
        let mut read_items = Vec::with_capacity(self.chunk_size);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    read_items.push(item);
                    step_execution.read_count += 1;

                    if read_items.len() >= self.chunk_size {
                        return Ok((read_items, ChunkStatus::Full));
                    }
                }
                Ok(None) => return Ok((read_items, ChunkStatus::Finished)),
                Err(error) => {
                    warn!("Error reading item: {}", error);
                    step_execution.read_error_count += 1;

                    if self.is_skip_limit_reached(step_execution) {
                        return Err(error);
                    }
                }
            }
        }
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: &[I],
    ) -> Result<Vec<O>, BatchError> {
        debug!("Processing chunk of {} items", read_items.len());
        let mut processed_items = Vec::with_capacity(read_items.len());

        for item in read_items {
            match self.processor.process(item) {
                Ok(processed_item) => processed_items.push(processed_item),
                Err(error) => {
                    warn!("Error processing item: {}", error);
                    step_execution.process_error_count += 1;

                    if self.is_skip_limit_reached(step_execution) {
                        return Err(error);
                    }
                }
            }
        }

        Ok(processed_items)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            debug!("No items to write, skipping write call");
            return Ok(());
        }

        debug!("Writing chunk of {} items", processed_items.len());

        match self.writer.write(processed_items) {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                Self::manage_error(self.writer.flush());
                Ok(())
            }
            Err(error) => {
                warn!("Error writing items: {}", error);
                step_execution.write_error_count += processed_items.len();

                if self.is_skip_limit_reached(step_execution) {
                    return Err(error);
                }
                Ok(())
            }
        }
    }

    fn is_skip_limit_reached(&self, step_execution: &StepExecution) -> bool {
        step_execution.read_error_count
            + step_execution.process_error_count
            + step_execution.write_error_count
            > self.skip_limit
    }

    fn manage_error(result: Result<(), BatchError>) {
        if let Err(error) = result {
            warn!("Non-fatal error: {}", error);
        }
    }
}

pub struct StepBuilder<'a, I, O> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: usize,
    skip_limit: usize,
}

impl<I, O> Default for StepBuilder<'_, I, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, I, O> StepBuilder<'a, I, O> {
    pub fn new() -> Self {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
            skip_limit: 0,
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Number of items written together; values below 1 are raised to 1.
    pub fn chunk(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Number of failed items tolerated before the step fails.
    pub fn skip_limit(mut self, skip_limit: usize) -> Self {
        self.skip_limit = skip_limit;
        self
    }

    pub fn build(self) -> ChunkOrientedStep<'a, I, O> {
        ChunkOrientedStep {
            name: self.name.unwrap_or_else(build_name),
            reader: self.reader.expect("Reader is required for building a step"),
            processor: self
                .processor
                .expect("Processor is required for building a step"),
            writer: self.writer.expect("Writer is required for building a step"),
            chunk_size: self.chunk_size,
            skip_limit: self.skip_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use crate::core::item::{ItemProcessorResult, ItemReaderResult, ItemWriterResult};

    use super::*;

    /// Yields the given values, turning negative ones into read errors.
    struct NumberReader {
        values: Vec<i32>,
        position: Cell<usize>,
    }

    impl NumberReader {
        fn new(values: Vec<i32>) -> Self {
            Self {
                values,
                position: Cell::new(0),
            }
        }
    }

    impl ItemReader<i32> for NumberReader {
        fn read(&self) -> ItemReaderResult<i32> {
            let position = self.position.get();
            self.position.set(position + 1);
            match self.values.get(position) {
                Some(value) if *value < 0 => Err(BatchError::ItemReader(format!("bad {value}"))),
                Some(value) => Ok(Some(*value)),
                None => Ok(None),
            }
        }
    }

    /// Doubles values, failing on zero.
    struct Doubler;

    impl ItemProcessor<i32, i32> for Doubler {
        fn process(&self, item: &i32) -> ItemProcessorResult<i32> {
            if *item == 0 {
                return Err(BatchError::ItemProcessor("zero".to_string()));
            }
            Ok(item * 2)
        }
    }

    #[derive(Default)]
    struct CollectingWriter {
        items: RefCell<Vec<i32>>,
        writes: Cell<usize>,
    }

    impl ItemWriter<i32> for CollectingWriter {
        fn write(&self, items: &[i32]) -> ItemWriterResult {
            self.writes.set(self.writes.get() + 1);
            self.items.borrow_mut().extend_from_slice(items);
            Ok(())
        }
    }

    #[test]
    fn processes_every_item_in_chunks() {
        let reader = NumberReader::new(vec![1, 2, 3, 4, 5]);
        let writer = CollectingWriter::default();

        let step: ChunkOrientedStep<i32, i32> = StepBuilder::new()
            .name("double")
            .reader(&reader)
            .processor(&Doubler)
            .writer(&writer)
            .chunk(2)
            .build();

        let mut execution = StepExecution::new(step.get_name());
        let result = step.execute(&mut execution);

        assert!(result.is_ok());
        assert_eq!(execution.status, StepStatus::Success);
        assert_eq!(execution.read_count, 5);
        assert_eq!(execution.write_count, 5);
        assert_eq!(*writer.items.borrow(), vec![2, 4, 6, 8, 10]);
        assert_eq!(writer.writes.get(), 3);
    }

    #[test]
    fn skips_failures_within_limit() {
        let reader = NumberReader::new(vec![1, -1, 0, 3]);
        let writer = CollectingWriter::default();

        let step: ChunkOrientedStep<i32, i32> = StepBuilder::new()
            .reader(&reader)
            .processor(&Doubler)
            .writer(&writer)
            .chunk(10)
            .skip_limit(2)
            .build();

        let mut execution = StepExecution::new(step.get_name());
        assert!(step.execute(&mut execution).is_ok());

        assert_eq!(execution.read_error_count, 1);
        assert_eq!(execution.process_error_count, 1);
        assert_eq!(*writer.items.borrow(), vec![2, 6]);
    }

    #[test]
    fn fails_once_skip_limit_is_exceeded() {
        let reader = NumberReader::new(vec![-1, -2, 1]);
        let writer = CollectingWriter::default();

        let step: ChunkOrientedStep<i32, i32> = StepBuilder::new()
            .reader(&reader)
            .processor(&Doubler)
            .writer(&writer)
            .skip_limit(1)
            .build();

        let mut execution = StepExecution::new(step.get_name());
        let result = step.execute(&mut execution);

        assert!(matches!(result, Err(BatchError::Step(_))));
        assert_eq!(execution.status, StepStatus::ReadError);
        assert!(writer.items.borrow().is_empty());
    }

    #[test]
    fn empty_source_succeeds_without_writing() {
        let reader = NumberReader::new(vec![]);
        let writer = CollectingWriter::default();

        let step: ChunkOrientedStep<i32, i32> = StepBuilder::new()
            .reader(&reader)
            .processor(&Doubler)
            .writer(&writer)
            .build();

        let mut execution = StepExecution::new(step.get_name());
        assert!(step.execute(&mut execution).is_ok());
        assert_eq!(writer.writes.get(), 0);
    }
}

use crate::counters::Counters;
use crate::error::{BenchError, BenchResult};
use crate::sut::SystemUnderTest;

/// One interaction with the system under test, recording zero or more metrics.
pub trait Step {
    fn execute(&mut self, sut: &mut dyn SystemUnderTest, counters: &mut Counters)
        -> BenchResult<()>;
}

impl<F> Step for F
where
    F: FnMut(&mut dyn SystemUnderTest, &mut Counters) -> BenchResult<()>,
{
    fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        self(sut, counters)
    }
}

/// A unit of work in a plan's task sequence.
pub enum Task {
    /// Preparation or cleanup step. Runs once per version run, reports nothing.
    Setup(Box<dyn Step>),
    /// Benchmarked operation. Its counters become a report row.
    Measured(PerformanceTask),
}

impl Task {
    pub fn setup(step: impl Step + 'static) -> Self {
        Task::Setup(Box::new(step))
    }

    pub fn measured(name: &str, replay: u32, step: impl Step + 'static) -> BenchResult<Self> {
        Ok(Task::Measured(PerformanceTask::new(name, replay, step)?))
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Task::Setup(_) => f.write_str("Task::Setup"),
            Task::Measured(t) => f
                .debug_struct("Task::Measured")
                .field("name", &t.name)
                .field("replay", &t.replay)
                .finish(),
        }
    }
}

/// A named step replayed `replay` times into the same counters, keeping the best reading.
pub struct PerformanceTask {
    name: String,
    replay: u32,
    step: Box<dyn Step>,
}

impl PerformanceTask {
    pub fn new(name: &str, replay: u32, step: impl Step + 'static) -> BenchResult<Self> {
        // Check compatibility with CSV format
        if name.contains(',') {
            return Err(BenchError::InvalidTaskName {
                name: name.to_string(),
            });
        }
        if replay == 0 {
            return Err(BenchError::InvalidReplay {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name: name.to_string(),
            replay,
            step: Box::new(step),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn replay(&self) -> u32 {
        self.replay
    }

    pub fn execute(
        &mut self,
        sut: &mut dyn SystemUnderTest,
        counters: &mut Counters,
    ) -> BenchResult<()> {
        self.step.execute(sut, counters)
    }
}

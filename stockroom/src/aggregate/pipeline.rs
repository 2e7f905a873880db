use crate::collection::Document;
use crate::errors::StockroomResult;
use crate::filter::{Filter, QueryPolicy};

use super::{GroupStage, SortStage, Stage, StageParser};

/// An ordered sequence of [Stage]s.
///
/// # Examples
///
/// ```rust,ignore
/// use stockroom::aggregate::{Accumulator, GroupStage, Pipeline, SumOperand};
/// use stockroom::common::SortOrder;
/// use stockroom::filter::field;
///
/// let pipeline = Pipeline::new()
///     .match_filter(field("total").gt(0))
///     .group(
///         GroupStage::by_field("productId")
///             .accumulate("totalSales", Accumulator::Sum(SumOperand::Field("total".into()))),
///     )
///     .sort(SortStage::new().by("totalSales", SortOrder::Descending))
///     .limit(5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline::default()
    }

    /// Parses stage documents such as `{ "$match": {...} }` or `{ limit: 5 }`.
    pub fn parse(stages: &[Document], policy: QueryPolicy) -> StockroomResult<Pipeline> {
        let parser = StageParser::new(policy);
        let mut pipeline = Pipeline::new();
        for stage in stages {
            pipeline.stages.extend(parser.parse(stage)?);
        }
        Ok(pipeline)
    }

    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn match_filter(self, filter: Filter) -> Self {
        self.stage(Stage::Match(filter))
    }

    pub fn group(self, group: GroupStage) -> Self {
        self.stage(Stage::Group(group))
    }

    pub fn sort(self, sort: SortStage) -> Self {
        self.stage(Stage::Sort(sort))
    }

    pub fn limit(self, limit: usize) -> Self {
        self.stage(Stage::Limit(limit))
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Runs every stage in order over `records`.
    pub fn execute(&self, records: Vec<Document>) -> StockroomResult<Vec<Document>> {
        let mut records = records;
        for stage in &self.stages {
            log::trace!("Running stage {} over {} records", stage, records.len());
            records = stage.apply(records)?;
        }
        Ok(records)
    }
}

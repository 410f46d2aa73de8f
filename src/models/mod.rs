mod records;

pub use records::{
    ApiDetectionReport, CorrelatedRequest, EndpointAnalysis, EndpointDocumentation, EndpointGroup,
    HeaderEntry, MinimizedHeaderSet, RawExchange,
};

/// Arrow schema definitions for the trial tables.
///
/// Text columns are nullable so that tables survive a round trip through
/// delimited text, where empty cells read back as null.
pub mod trials {
    use arrow::datatypes::{DataType, Field, Schema};

    // ── Flat columns ──
    pub const NCT_ID: &str = "nct_id";
    pub const TITLE: &str = "title";
    pub const OFFICIAL_TITLE: &str = "official_title";
    pub const OVERALL_STATUS: &str = "overall_status";
    pub const PHASE: &str = "phase";
    pub const STUDY_TYPE: &str = "study_type";
    pub const ENROLLMENT_COUNT: &str = "enrollment_count";
    pub const ENROLLMENT_TYPE: &str = "enrollment_type";
    pub const START_DATE: &str = "start_date";
    pub const COMPLETION_DATE: &str = "completion_date";
    pub const LEAD_SPONSOR: &str = "lead_sponsor";
    pub const SPONSOR_CLASS: &str = "sponsor_class";
    pub const ALLOCATION: &str = "allocation";
    pub const INTERVENTION_MODEL: &str = "intervention_model";
    pub const MASKING: &str = "masking";
    pub const INTERVENTION_TYPES: &str = "intervention_types";
    pub const INTERVENTION_NAMES: &str = "intervention_names";
    pub const CONDITIONS: &str = "conditions";
    pub const PRIMARY_OUTCOME_MEASURES: &str = "primary_outcome_measures";
    pub const MIN_AGE: &str = "min_age";
    pub const MAX_AGE: &str = "max_age";
    pub const SEX: &str = "sex";
    pub const HAS_RESULTS: &str = "has_results";

    // ── Derived columns ──
    pub const DURATION_DAYS: &str = "duration_days";
    pub const IS_COMPLETED: &str = "is_completed";
    pub const IS_RECRUITING: &str = "is_recruiting";
    pub const PHASE_NUMERIC: &str = "phase_numeric";
    pub const IS_RANDOMIZED: &str = "is_randomized";
    pub const IS_BLINDED: &str = "is_blinded";
    pub const IS_INDUSTRY_SPONSORED: &str = "is_industry_sponsored";
    pub const INTERVENTION_COUNT: &str = "intervention_count";

    // ── Label columns ──
    pub const COMPLETED: &str = "completed";
    pub const TESTS_APPROVED_DRUG: &str = "tests_approved_drug";

    fn text(name: &str) -> Field {
        Field::new(name, DataType::Utf8, true)
    }

    /// Fields of the flattened trial table, in column order.
    pub fn flat_fields() -> Vec<Field> {
        vec![
            text(NCT_ID),
            text(TITLE),
            text(OFFICIAL_TITLE),
            text(OVERALL_STATUS),
            text(PHASE),
            text(STUDY_TYPE),
            Field::new(ENROLLMENT_COUNT, DataType::Float64, true),
            text(ENROLLMENT_TYPE),
            Field::new(START_DATE, DataType::Date32, true),
            Field::new(COMPLETION_DATE, DataType::Date32, true),
            text(LEAD_SPONSOR),
            text(SPONSOR_CLASS),
            text(ALLOCATION),
            text(INTERVENTION_MODEL),
            text(MASKING),
            text(INTERVENTION_TYPES),
            text(INTERVENTION_NAMES),
            text(CONDITIONS),
            text(PRIMARY_OUTCOME_MEASURES),
            text(MIN_AGE),
            text(MAX_AGE),
            text(SEX),
            Field::new(HAS_RESULTS, DataType::Boolean, false),
        ]
    }

    /// Fields appended by the derived-feature stage, in column order.
    pub fn derived_fields() -> Vec<Field> {
        vec![
            Field::new(DURATION_DAYS, DataType::Int64, true),
            Field::new(IS_COMPLETED, DataType::Boolean, false),
            Field::new(IS_RECRUITING, DataType::Boolean, false),
            Field::new(PHASE_NUMERIC, DataType::Float64, true),
            Field::new(IS_RANDOMIZED, DataType::Boolean, false),
            Field::new(IS_BLINDED, DataType::Boolean, false),
            Field::new(IS_INDUSTRY_SPONSORED, DataType::Boolean, false),
            Field::new(INTERVENTION_COUNT, DataType::Int64, false),
        ]
    }

    /// Schema for the flattened, type-coerced trial table.
    pub fn flat_schema() -> Schema {
        Schema::new(flat_fields())
    }

    /// Schema for the trial table with derived features.
    pub fn enriched_schema() -> Schema {
        let mut fields = flat_fields();
        fields.extend(derived_fields());
        Schema::new(fields)
    }

    /// Schema for the labeled table; the approved-drug column is optional.
    pub fn labeled_schema(with_approved_drug: bool) -> Schema {
        let mut fields = flat_fields();
        fields.extend(derived_fields());
        fields.push(Field::new(COMPLETED, DataType::Int64, false));
        if with_approved_drug {
            fields.push(Field::new(TESTS_APPROVED_DRUG, DataType::Int64, false));
        }
        Schema::new(fields)
    }
}

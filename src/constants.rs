/// Column names read from and written to test-result tables.
pub mod columns {
    /// Product variant / SKU under test.
    pub const ITEM_NUMBER: &str = "ITEM_NUMBER";
    /// Test session identifier.
    pub const TEST_NUMBER: &str = "TEST_NUMBER";
    /// Measurement name.
    pub const RESULT_NAME: &str = "RESULT_NAME";
    /// Recorded measurement value.
    pub const RESPONSE: &str = "RESPONSE";

    /// Columns every loaded table must carry, in reporting order.
    pub const REQUIRED: [&str; 4] = [ITEM_NUMBER, TEST_NUMBER, RESULT_NAME, RESPONSE];

    /// Lower bound applied to a classified row.
    pub const LOWER_BOUND: &str = "Lower_Bound";
    /// Upper bound applied to a classified row.
    pub const UPPER_BOUND: &str = "Upper_Bound";
    /// NORMAL / ABNORMAL label.
    pub const IS_OUTLIER: &str = "IS_OUTLIER";

    /// Columns appended to the source columns by classification.
    pub const DERIVED: [&str; 3] = [LOWER_BOUND, UPPER_BOUND, IS_OUTLIER];

    /// Projection used when listing abnormal records.
    pub const DISPLAY: [&str; 7] = [
        ITEM_NUMBER,
        TEST_NUMBER,
        RESULT_NAME,
        RESPONSE,
        LOWER_BOUND,
        UPPER_BOUND,
        IS_OUTLIER,
    ];
}

/// Constants used when choosing which measurements can be analysed.
pub mod analysis {
    /// Summary/meta measurements that are never offered for bound checking.
    pub const EXCLUDED_RESULT_NAMES: [&str; 5] = [
        "Ave Dim Stab Warp",
        "Std Dim Stab Warp",
        "Ave Dim Stab Fill",
        "Std Dim Stab Fill",
        "Test Complete?",
    ];
    /// First quartile used for suggested lower bounds.
    pub const SUGGESTED_LOWER_QUANTILE: f64 = 0.25;
    /// Third quartile used for suggested upper bounds.
    pub const SUGGESTED_UPPER_QUANTILE: f64 = 0.75;
    /// Separator used when listing the measurements affected in one session.
    pub const RESULT_NAME_SEPARATOR: &str = ", ";
}

/// Constants used by the workbook exporter.
pub mod export {
    /// Name of the single sheet written on export.
    pub const SHEET_NAME: &str = "Results";
    /// Fill colour for abnormal rows (`#FFCCCC`).
    pub const HIGHLIGHT_RGB: u32 = 0xFF_CC_CC;
    /// File name proposed by the save dialog.
    pub const DEFAULT_FILE_NAME: &str = "anomaly_detection_results.xlsx";
}

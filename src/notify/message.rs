// Chat message bodies

use std::path::Path;

/// File name the archive is uploaded under
pub const REPORT_FILENAME: &str = "playwright-report.zip";

/// Title shown for the uploaded file
pub const REPORT_TITLE: &str = "Playwright Report";

/// Initial comment attached to the uploaded archive
pub fn upload_comment(summary: &str) -> String {
    format!(
        "*Test run finished*\n\
         ```\n{summary}\n```\n\
         To view the report: download `{REPORT_FILENAME}`, unzip it and open `index.html` \
         in a browser, or run `npx playwright show-report <unzipped folder>`."
    )
}

/// Plain message posted when the archive could not be uploaded
pub fn fallback_message(summary: &str, report_path: &Path) -> String {
    format!(
        "{summary}\n\
         Report upload failed. The HTML report was left on the runner at `{}`.\n\
         Retrieve it from the job artifacts or the runner workspace, then open \
         `index.html` or run `npx playwright show-report`.",
        report_path.display()
    )
}

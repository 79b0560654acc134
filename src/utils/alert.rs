use std::io::Write;

/// 以終端機 BEL 字元發出提示音
pub fn beep(times: usize) {
    let mut stdout = std::io::stdout();
    for _ in 0..times {
        let _ = write!(stdout, "\x07");
    }
    let _ = stdout.flush();
}

//! 실시간 작업 트리 렌더러.
//! 직전 프레임 줄 수만큼 지우고 새 프레임을 그린다.

mod board;
pub mod elapsed;
mod frame;
pub mod progress_bar;

use std::io::{self, Write};

use crossterm::cursor::{Hide, MoveToColumn, MoveUp, Show};
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};

pub use board::Board;
pub use elapsed::format_elapsed;
pub use frame::{FrameStyle, SPINNER_FRAMES, SPINNER_INTERVAL, build_frame, spinner_frame};

/// 지우기/다시 그리기만 담당한다. 무엇을 그릴지는 호출자가 정한다.
pub struct Renderer<W: Write> {
    out: W,
    prev_lines: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, prev_lines: 0 }
    }

    pub fn hide_cursor(&mut self) -> io::Result<()> {
        queue!(self.out, Hide)?;
        self.out.flush()
    }

    /// 마지막 프레임을 남긴 채 줄을 바꾸고 커서를 되돌린다.
    pub fn release(&mut self) -> io::Result<()> {
        if self.prev_lines > 0 {
            writeln!(self.out)?;
        }
        self.prev_lines = 0;
        queue!(self.out, Show)?;
        self.out.flush()
    }

    /// `above` 줄은 프레임 위에 한 번만 출력되어 다음 틱에 지워지지 않는다.
    pub fn draw(&mut self, above: &[String], frame: &[String]) -> io::Result<()> {
        self.erase()?;
        for line in above {
            writeln!(self.out, "{line}")?;
        }
        write!(self.out, "{}", frame.join("\n"))?;
        self.prev_lines = frame.len();
        self.out.flush()
    }

    pub fn prev_lines(&self) -> usize {
        self.prev_lines
    }

    fn erase(&mut self) -> io::Result<()> {
        if self.prev_lines == 0 {
            return Ok(());
        }
        queue!(self.out, MoveToColumn(0))?;
        if self.prev_lines > 1 {
            queue!(self.out, MoveUp((self.prev_lines - 1) as u16))?;
        }
        queue!(self.out, Clear(ClearType::FromCursorDown))?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

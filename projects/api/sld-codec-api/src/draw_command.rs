//! Run-length skip/draw commands.
//!
//! A layer's block grid is walked in row-major order. Each [`DrawCommand`] first skips
//! `skip` blocks, taking them from the previous frame, then draws the next `draw` blocks
//! from the layer's block stream.

/// One skip run followed by one draw run, both counted in blocks.
///
/// Counts are 8 bit to match the container's wire format; longer runs are split across
/// several commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DrawCommand {
    /// Blocks to reuse from the previous frame.
    pub skip: u8,
    /// Blocks to read from the block stream.
    pub draw: u8,
}

impl DrawCommand {
    /// Creates a new command.
    pub const fn new(skip: u8, draw: u8) -> Self {
        Self { skip, draw }
    }

    /// Number of blocks this command covers.
    #[inline]
    pub const fn total(&self) -> usize {
        self.skip as usize + self.draw as usize
    }
}

/// Number of blocks covered by `commands`.
pub fn command_total(commands: &[DrawCommand]) -> usize {
    commands.iter().map(DrawCommand::total).sum()
}

/// Number of blocks `commands` read from the block stream.
pub fn draw_total(commands: &[DrawCommand]) -> usize {
    commands.iter().map(|c| c.draw as usize).sum()
}

/// Builds the shortest command list for a row-major sequence of skip decisions.
///
/// Each command takes up to 255 skippable blocks followed by up to 255 drawn blocks.
/// A command is only emitted when it covers at least one block.
///
/// # Example
///
/// ```
/// use sld_codec_api::draw_command::{commands_from_skips, DrawCommand};
///
/// let skips = [true, true, false, true, false, false];
/// assert_eq!(
///     commands_from_skips(skips),
///     vec![DrawCommand::new(2, 1), DrawCommand::new(1, 2)]
/// );
/// ```
pub fn commands_from_skips(skips: impl IntoIterator<Item = bool>) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    let mut skips = skips.into_iter().peekable();

    while skips.peek().is_some() {
        let mut command = DrawCommand::default();
        while command.skip < u8::MAX && skips.next_if(|skip| *skip).is_some() {
            command.skip += 1;
        }
        while command.draw < u8::MAX && skips.next_if(|skip| !*skip).is_some() {
            command.draw += 1;
        }

        if command.total() == 0 {
            break;
        }
        commands.push(command);
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_prelude::*;

    #[rstest]
    #[case(vec![], vec![])]
    #[case(vec![true; 4], vec![DrawCommand::new(4, 0)])]
    #[case(vec![false; 3], vec![DrawCommand::new(0, 3)])]
    #[case(
        vec![false, true, false, false, true, true],
        vec![DrawCommand::new(0, 1), DrawCommand::new(1, 2), DrawCommand::new(2, 0)]
    )]
    fn builds_runs(#[case] skips: Vec<bool>, #[case] expected: Vec<DrawCommand>) {
        assert_eq!(commands_from_skips(skips), expected);
    }

    #[test]
    fn splits_long_runs() {
        let skips = core::iter::repeat(true)
            .take(300)
            .chain(core::iter::repeat(false).take(600));
        let commands = commands_from_skips(skips);

        assert_eq!(
            commands,
            vec![
                DrawCommand::new(255, 0),
                DrawCommand::new(45, 255),
                DrawCommand::new(0, 255),
                DrawCommand::new(0, 90),
            ]
        );
        assert_eq!(command_total(&commands), 900);
        assert_eq!(draw_total(&commands), 600);
    }
}

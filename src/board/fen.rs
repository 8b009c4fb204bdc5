use super::fen_tables::{CHAR_TO_PC, PC_TO_CHAR};
use super::{Board, CASTLE_BK, CASTLE_BQ, CASTLE_WK, CASTLE_WQ, Color, Piece};
use crate::square::Square;

impl Board {
    /// Loads a full FEN record into `self`, replacing every field. On parse
    /// failure `self` may be left partially mutated; callers that need
    /// atomicity should clone first.
    pub fn set_fen(&mut self, fen: &str) -> Result<(), String> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(format!("FEN must have at least 4 fields, got {}", fields.len()));
        }

        let mut board = Board::new_empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(format!("FEN piece field must have 8 ranks, got {}", ranks.len()));
        }

        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top;
            let mut file = 0usize;
            for ch in rank_str.chars() {
                if file > 8 {
                    return Err(format!("rank {} overflows the board", rank_str));
                }
                if let Some(skip) = ch.to_digit(10) {
                    file += skip as usize;
                    continue;
                }
                let (piece, color) = CHAR_TO_PC[ch as usize]
                    .ok_or_else(|| format!("invalid FEN piece glyph '{}'", ch))?;
                if file >= 8 {
                    return Err(format!("rank {} overflows the board", rank_str));
                }
                let sq = Square::from_index((rank * 8 + file) as u8);
                let bb = board.bb(color, piece) | (1u64 << sq.index());
                board.set_bb(color, piece, bb);
                file += 1;
            }
            if file != 8 {
                return Err(format!("rank {} does not cover 8 files", rank_str));
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(format!("invalid side to move '{}'", other)),
        };

        let mut rights = 0u8;
        if fields[2] != "-" {
            for ch in fields[2].chars() {
                rights |= match ch {
                    'K' => CASTLE_WK,
                    'Q' => CASTLE_WQ,
                    'k' => CASTLE_BK,
                    'q' => CASTLE_BQ,
                    other => return Err(format!("invalid castling glyph '{}'", other)),
                };
            }
        }
        board.castling_rights = rights;

        board.en_passant = if fields[3] == "-" {
            None
        } else {
            Some(Square::from_algebraic(fields[3]).ok_or_else(|| format!("invalid en passant square '{}'", fields[3]))?)
        };

        board.halfmove_clock = fields
            .get(4)
            .map(|s| s.parse::<u32>())
            .transpose()
            .map_err(|_| "invalid halfmove clock".to_string())?
            .unwrap_or(0);

        board.fullmove_number = fields
            .get(5)
            .map(|s| s.parse::<u32>())
            .transpose()
            .map_err(|_| "invalid fullmove number".to_string())?
            .unwrap_or(1);

        board.history.clear();
        board.refresh_zobrist();

        *self = board;
        Ok(())
    }

    /// Serializes `self` into a full 6-field FEN record.
    pub fn to_fen(&self) -> String {
        let mut out = String::with_capacity(64);

        for rank_from_top in 0..8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8 {
                let sq = Square::from_index((rank * 8 + file) as u8);
                match self.piece_at(sq) {
                    None => empty_run += 1,
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            out.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let idx = (color as usize) * 6 + (piece as usize);
                        out.push(PC_TO_CHAR[idx]);
                    }
                }
            }
            if empty_run > 0 {
                out.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                out.push('/');
            }
        }

        out.push(' ');
        out.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });

        out.push(' ');
        if self.castling_rights == 0 {
            out.push('-');
        } else {
            if self.has_castling(CASTLE_WK) {
                out.push('K');
            }
            if self.has_castling(CASTLE_WQ) {
                out.push('Q');
            }
            if self.has_castling(CASTLE_BK) {
                out.push('k');
            }
            if self.has_castling(CASTLE_BQ) {
                out.push('q');
            }
        }

        out.push(' ');
        match self.en_passant {
            Some(sq) => out.push_str(&sq.to_string()),
            None => out.push('-'),
        }

        out.push(' ');
        out.push_str(&self.halfmove_clock.to_string());
        out.push(' ');
        out.push_str(&self.fullmove_number.to_string());

        out
    }
}

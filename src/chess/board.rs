use thiserror::Error;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn flip(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    /// Accepts the piece letter used in UCI promotions, either case.
    pub fn from_promotion_char(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    fn from_fen_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let kind = match c.to_ascii_lowercase() {
            'p' => PieceKind::Pawn,
            'n' => PieceKind::Knight,
            'b' => PieceKind::Bishop,
            'r' => PieceKind::Rook,
            'q' => PieceKind::Queen,
            'k' => PieceKind::King,
            _ => return None,
        };
        Some(Piece { color, kind })
    }
}

/// A from/to/promotion move in coordinate form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mv {
    pub from: u8,
    pub to: u8,
    pub promotion: Option<PieceKind>,
}

impl Mv {
    /// Builds a move from the wire representation: two square names
    /// plus an optional promotion letter (empty string for none).
    pub fn from_parts(from: &str, to: &str, promotion: &str) -> Option<Mv> {
        let from = parse_square(from)?;
        let to = parse_square(to)?;
        let promotion = match promotion {
            "" => None,
            p => {
                let mut chars = p.chars();
                let kind = PieceKind::from_promotion_char(chars.next()?)?;
                if chars.next().is_some() {
                    return None;
                }
                Some(kind)
            }
        };
        Some(Mv {
            from,
            to,
            promotion,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("FEN must have 6 fields, got {0}")]
    FieldCount(usize),
    #[error("Bad piece placement: {0}")]
    Placement(String),
    #[error("Side to move must be 'w' or 'b'")]
    SideToMove,
    #[error("Bad castling field")]
    Castling,
    #[error("Bad en passant field")]
    EnPassant,
    #[error("Bad move counter")]
    Counter,
    #[error("Each side must have exactly one king")]
    Kings,
}

/// `a1` is square 0, `h8` is square 63.
pub fn parse_square(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let file = chars.next()?;
    let rank = chars.next()?;
    if chars.next().is_some() || !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
        return None;
    }
    Some((rank as u8 - b'1') * 8 + (file as u8 - b'a'))
}

pub fn square_name(sq: u8) -> String {
    let file = (b'a' + (sq & 7)) as char;
    let rank = (b'1' + (sq >> 3)) as char;
    format!("{}{}", file, rank)
}

const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

fn offset(sq: u8, df: i8, dr: i8) -> Option<u8> {
    let file = (sq & 7) as i8 + df;
    let rank = (sq >> 3) as i8 + dr;
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some((rank * 8 + file) as u8)
    } else {
        None
    }
}

/// A full position: piece placement plus the side effects needed to
/// replay engine lines (castling rights, en passant, move counters).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    squares: [Option<Piece>; 64],
    pub turn: Color,
    /// White kingside, white queenside, black kingside, black queenside
    castling: [bool; 4],
    ep_square: Option<u8>,
    halfmove: u32,
    fullmove: u32,
}

impl Board {
    pub fn start() -> Board {
        Board::from_fen(START_FEN).expect("start position FEN is valid")
    }

    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut squares = [None; 64];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(fields[0].to_string()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || skip > 8 {
                        return Err(FenError::Placement(rank_str.to_string()));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| FenError::Placement(rank_str.to_string()))?;
                    if file >= 8 {
                        return Err(FenError::Placement(rank_str.to_string()));
                    }
                    squares[(rank * 8 + file) as usize] = Some(piece);
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::Placement(rank_str.to_string()));
            }
        }

        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            _ => return Err(FenError::SideToMove),
        };

        let mut castling = [false; 4];
        if fields[2] != "-" {
            for c in fields[2].chars() {
                let idx = match c {
                    'K' => 0,
                    'Q' => 1,
                    'k' => 2,
                    'q' => 3,
                    _ => return Err(FenError::Castling),
                };
                if castling[idx] {
                    return Err(FenError::Castling);
                }
                castling[idx] = true;
            }
        }

        let ep_square = match fields[3] {
            "-" => None,
            name => {
                let sq = parse_square(name).ok_or(FenError::EnPassant)?;
                // Rank 3 targets follow a white double push (black to
                // move), rank 6 targets a black one.
                let expected_turn = match sq >> 3 {
                    2 => Color::Black,
                    5 => Color::White,
                    _ => return Err(FenError::EnPassant),
                };
                if turn != expected_turn {
                    return Err(FenError::EnPassant);
                }
                Some(sq)
            }
        };

        let halfmove: u32 = fields[4].parse().map_err(|_| FenError::Counter)?;
        let fullmove: u32 = fields[5].parse().map_err(|_| FenError::Counter)?;
        if fullmove == 0 {
            return Err(FenError::Counter);
        }

        let board = Board {
            squares,
            turn,
            castling,
            ep_square,
            halfmove,
            fullmove,
        };
        for color in [Color::White, Color::Black] {
            let kings = board
                .squares
                .iter()
                .flatten()
                .filter(|p| p.color == color && p.kind == PieceKind::King)
                .count();
            if kings != 1 {
                return Err(FenError::Kings);
            }
        }
        Ok(board)
    }

    pub fn piece_at(&self, sq: u8) -> Option<Piece> {
        self.squares[sq as usize]
    }

    fn king_square(&self, color: Color) -> u8 {
        for sq in 0..64u8 {
            if self.squares[sq as usize]
                == Some(Piece {
                    color,
                    kind: PieceKind::King,
                })
            {
                return sq;
            }
        }
        unreachable!("board invariant: each side has exactly one king")
    }

    pub fn in_check(&self, color: Color) -> bool {
        self.is_attacked(self.king_square(color), color.flip())
    }

    /// True when any piece of `by` attacks `sq`.
    fn is_attacked(&self, sq: u8, by: Color) -> bool {
        let pawn_rank_step = match by {
            Color::White => -1, // a white pawn attacks from one rank below
            Color::Black => 1,
        };
        for df in [-1i8, 1] {
            if let Some(from) = offset(sq, df, pawn_rank_step) {
                if self.squares[from as usize]
                    == Some(Piece {
                        color: by,
                        kind: PieceKind::Pawn,
                    })
                {
                    return true;
                }
            }
        }
        for (df, dr) in KNIGHT_JUMPS {
            if let Some(from) = offset(sq, df, dr) {
                if self.squares[from as usize]
                    == Some(Piece {
                        color: by,
                        kind: PieceKind::Knight,
                    })
                {
                    return true;
                }
            }
        }
        for (df, dr) in ROOK_DIRS.iter().chain(BISHOP_DIRS.iter()) {
            if let Some(from) = offset(sq, *df, *dr) {
                if self.squares[from as usize]
                    == Some(Piece {
                        color: by,
                        kind: PieceKind::King,
                    })
                {
                    return true;
                }
            }
        }
        for (dirs, slider) in [
            (&ROOK_DIRS, PieceKind::Rook),
            (&BISHOP_DIRS, PieceKind::Bishop),
        ] {
            for (df, dr) in dirs {
                let mut cur = sq;
                while let Some(next) = offset(cur, *df, *dr) {
                    match self.squares[next as usize] {
                        None => cur = next,
                        Some(p) => {
                            if p.color == by && (p.kind == slider || p.kind == PieceKind::Queen) {
                                return true;
                            }
                            break;
                        }
                    }
                }
            }
        }
        false
    }

    /// All legal moves for the side to move.
    pub fn legal_moves(&self) -> Vec<Mv> {
        let mut out = Vec::new();
        for mv in self.pseudo_moves() {
            let mut next = self.clone();
            next.apply_unchecked(mv);
            if !next.is_attacked(next.king_square(self.turn), self.turn.flip()) {
                out.push(mv);
            }
        }
        out
    }

    fn pseudo_moves(&self) -> Vec<Mv> {
        let mut out = Vec::new();
        let us = self.turn;
        for from in 0..64u8 {
            let Some(piece) = self.squares[from as usize] else {
                continue;
            };
            if piece.color != us {
                continue;
            }
            match piece.kind {
                PieceKind::Pawn => self.pawn_moves(from, us, &mut out),
                PieceKind::Knight => {
                    for (df, dr) in KNIGHT_JUMPS {
                        self.push_step(from, df, dr, us, &mut out);
                    }
                }
                PieceKind::King => {
                    for (df, dr) in ROOK_DIRS.iter().chain(BISHOP_DIRS.iter()) {
                        self.push_step(from, *df, *dr, us, &mut out);
                    }
                    self.castling_moves(from, us, &mut out);
                }
                PieceKind::Rook => self.slider_moves(from, &ROOK_DIRS, us, &mut out),
                PieceKind::Bishop => self.slider_moves(from, &BISHOP_DIRS, us, &mut out),
                PieceKind::Queen => {
                    self.slider_moves(from, &ROOK_DIRS, us, &mut out);
                    self.slider_moves(from, &BISHOP_DIRS, us, &mut out);
                }
            }
        }
        out
    }

    fn push_step(&self, from: u8, df: i8, dr: i8, us: Color, out: &mut Vec<Mv>) {
        if let Some(to) = offset(from, df, dr) {
            if self.squares[to as usize].map(|p| p.color) != Some(us) {
                out.push(Mv {
                    from,
                    to,
                    promotion: None,
                });
            }
        }
    }

    fn slider_moves(&self, from: u8, dirs: &[(i8, i8); 4], us: Color, out: &mut Vec<Mv>) {
        for (df, dr) in dirs {
            let mut cur = from;
            while let Some(to) = offset(cur, *df, *dr) {
                match self.squares[to as usize] {
                    None => {
                        out.push(Mv {
                            from,
                            to,
                            promotion: None,
                        });
                        cur = to;
                    }
                    Some(p) => {
                        if p.color != us {
                            out.push(Mv {
                                from,
                                to,
                                promotion: None,
                            });
                        }
                        break;
                    }
                }
            }
        }
    }

    fn pawn_moves(&self, from: u8, us: Color, out: &mut Vec<Mv>) {
        let (step, start_rank, promo_rank) = match us {
            Color::White => (1i8, 1u8, 7u8),
            Color::Black => (-1i8, 6u8, 0u8),
        };
        let push_pawn = |to: u8, out: &mut Vec<Mv>| {
            if to >> 3 == promo_rank {
                for kind in [
                    PieceKind::Queen,
                    PieceKind::Rook,
                    PieceKind::Bishop,
                    PieceKind::Knight,
                ] {
                    out.push(Mv {
                        from,
                        to,
                        promotion: Some(kind),
                    });
                }
            } else {
                out.push(Mv {
                    from,
                    to,
                    promotion: None,
                });
            }
        };

        if let Some(to) = offset(from, 0, step) {
            if self.squares[to as usize].is_none() {
                push_pawn(to, out);
                if from >> 3 == start_rank {
                    if let Some(two) = offset(from, 0, 2 * step) {
                        if self.squares[two as usize].is_none() {
                            out.push(Mv {
                                from,
                                to: two,
                                promotion: None,
                            });
                        }
                    }
                }
            }
        }
        // The en passant target is only capturable from the rank the
        // opposing double push just crossed.
        let ep_rank = match us {
            Color::White => 5,
            Color::Black => 2,
        };
        for df in [-1i8, 1] {
            if let Some(to) = offset(from, df, step) {
                let is_capture = self.squares[to as usize].map(|p| p.color) == Some(us.flip());
                let is_ep = Some(to) == self.ep_square && to >> 3 == ep_rank;
                if is_capture || is_ep {
                    push_pawn(to, out);
                }
            }
        }
    }

    fn castling_moves(&self, from: u8, us: Color, out: &mut Vec<Mv>) {
        let (king_home, kingside, queenside, them) = match us {
            Color::White => (4u8, self.castling[0], self.castling[1], Color::Black),
            Color::Black => (60u8, self.castling[2], self.castling[3], Color::White),
        };
        if from != king_home || self.is_attacked(king_home, them) {
            return;
        }
        let rook = Some(Piece {
            color: us,
            kind: PieceKind::Rook,
        });
        if kingside
            && self.squares[(king_home + 1) as usize].is_none()
            && self.squares[(king_home + 2) as usize].is_none()
            && self.squares[(king_home + 3) as usize] == rook
            && !self.is_attacked(king_home + 1, them)
            && !self.is_attacked(king_home + 2, them)
        {
            out.push(Mv {
                from,
                to: king_home + 2,
                promotion: None,
            });
        }
        if queenside
            && self.squares[(king_home - 1) as usize].is_none()
            && self.squares[(king_home - 2) as usize].is_none()
            && self.squares[(king_home - 3) as usize].is_none()
            && self.squares[(king_home - 4) as usize] == rook
            && !self.is_attacked(king_home - 1, them)
            && !self.is_attacked(king_home - 2, them)
        {
            out.push(Mv {
                from,
                to: king_home - 2,
                promotion: None,
            });
        }
    }

    /// Plays a move known to come from [`Board::legal_moves`].
    fn apply_unchecked(&mut self, mv: Mv) {
        let piece = self.squares[mv.from as usize].expect("move source is occupied");
        let us = piece.color;
        let mut is_capture = self.squares[mv.to as usize].is_some();

        // En passant: the captured pawn is beside the destination.
        if piece.kind == PieceKind::Pawn && Some(mv.to) == self.ep_square && !is_capture {
            let victim = (mv.from & !7) | (mv.to & 7); // same rank as from, same file as to
            self.squares[victim as usize] = None;
            is_capture = true;
        }

        self.squares[mv.to as usize] = match mv.promotion {
            Some(kind) => Some(Piece { color: us, kind }),
            None => Some(piece),
        };
        self.squares[mv.from as usize] = None;

        // Castling moves the rook as well.
        if piece.kind == PieceKind::King && mv.to.abs_diff(mv.from) == 2 {
            let rank_base = mv.from & !7;
            let (rook_from, rook_to) = if mv.to > mv.from {
                (rank_base + 7, rank_base + 5)
            } else {
                (rank_base, rank_base + 3)
            };
            self.squares[rook_to as usize] = self.squares[rook_from as usize].take();
        }

        if piece.kind == PieceKind::King {
            match us {
                Color::White => {
                    self.castling[0] = false;
                    self.castling[1] = false;
                }
                Color::Black => {
                    self.castling[2] = false;
                    self.castling[3] = false;
                }
            }
        }
        for sq in [mv.from, mv.to] {
            match sq {
                7 => self.castling[0] = false,
                0 => self.castling[1] = false,
                63 => self.castling[2] = false,
                56 => self.castling[3] = false,
                _ => {}
            }
        }

        self.ep_square = if piece.kind == PieceKind::Pawn && mv.to.abs_diff(mv.from) == 16 {
            Some((mv.from + mv.to) / 2)
        } else {
            None
        };

        if piece.kind == PieceKind::Pawn || is_capture {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if us == Color::Black {
            self.fullmove += 1;
        }
        self.turn = us.flip();
    }

    /// Validates the move against the current position, plays it, and
    /// returns its SAN rendering (with `+`/`#` suffix). Returns `None`
    /// without touching the board when the move is not legal here.
    pub fn san_move(&mut self, mv: Mv) -> Option<String> {
        let piece = self.squares[mv.from as usize]?;
        if piece.color != self.turn {
            return None;
        }
        let legal = self.legal_moves();
        if !legal.contains(&mv) {
            return None;
        }
        let base = self.san_body(piece, mv, &legal);
        self.apply_unchecked(mv);
        let suffix = if self.in_check(self.turn) {
            if self.legal_moves().is_empty() {
                "#"
            } else {
                "+"
            }
        } else {
            ""
        };
        Some(format!("{}{}", base, suffix))
    }

    fn san_body(&self, piece: Piece, mv: Mv, legal: &[Mv]) -> String {
        if piece.kind == PieceKind::King && mv.to.abs_diff(mv.from) == 2 {
            return if mv.to > mv.from { "O-O" } else { "O-O-O" }.to_string();
        }

        if piece.kind == PieceKind::Pawn {
            let is_capture = self.squares[mv.to as usize].is_some() || Some(mv.to) == self.ep_square;
            let mut san = if is_capture {
                format!(
                    "{}x{}",
                    (b'a' + (mv.from & 7)) as char,
                    square_name(mv.to)
                )
            } else {
                square_name(mv.to)
            };
            if let Some(kind) = mv.promotion {
                san.push('=');
                san.push(kind.letter());
            }
            return san;
        }

        // Disambiguate against other pieces of the same kind that can
        // also reach the destination.
        let rivals: Vec<u8> = legal
            .iter()
            .filter(|m| {
                m.from != mv.from
                    && m.to == mv.to
                    && self.squares[m.from as usize].map(|p| p.kind) == Some(piece.kind)
            })
            .map(|m| m.from)
            .collect();
        let disambig = if rivals.is_empty() {
            String::new()
        } else if rivals.iter().all(|&r| r & 7 != mv.from & 7) {
            ((b'a' + (mv.from & 7)) as char).to_string()
        } else if rivals.iter().all(|&r| r >> 3 != mv.from >> 3) {
            ((b'1' + (mv.from >> 3)) as char).to_string()
        } else {
            square_name(mv.from)
        };

        let capture = if self.squares[mv.to as usize].is_some() {
            "x"
        } else {
            ""
        };
        format!(
            "{}{}{}{}",
            piece.kind.letter(),
            disambig,
            capture,
            square_name(mv.to)
        )
    }
}

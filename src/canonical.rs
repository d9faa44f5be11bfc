//! Pre-authored canonical answers and lecturer records.
//!
//! These texts have been hand-verified against the source documents and
//! are authoritative: any transformation beyond whitespace normalization
//! is a defect. The generator occasionally paraphrases numbered procedures
//! in ways that lose fidelity, which is why questions recognized here
//! never reach it.

/// A canonical question family: a pattern set and the literal answer.
///
/// Patterns are case-insensitive regular expressions matched against the
/// lowercased, trimmed question. The first family with any matching
/// pattern wins, in declaration order.
pub struct CanonicalEntry {
    /// Regular expressions recognizing the question family.
    pub patterns: &'static [&'static str],
    /// The authoritative answer, returned verbatim.
    pub answer: &'static str,
}

/// Opening phrase of the thesis-topic procedure; used by the shaper's
/// canonical override when a generative answer partially reproduces it.
pub const SKRIPSI_TRIGGER: &str =
    "Untuk mengajukan judul atau topik skripsi, berikut adalah prosedur yang harus diikuti:";

/// Canonical procedure for submitting a thesis title or topic.
pub const SKRIPSI_ANSWER: &str = "\
Untuk mengajukan judul atau topik skripsi, berikut adalah prosedur yang harus diikuti:
1. Mahasiswa berkonsultasi dengan dosen pembimbing akademik mengenai rencana judul atau topik skripsi.
2. Mahasiswa mengisi formulir pengajuan judul/topik skripsi yang tersedia di laman program studi.
3. Formulir yang telah diisi diserahkan kepada koordinator skripsi untuk diverifikasi.
4. Judul atau topik yang disetujui ditetapkan melalui surat keputusan pembimbing oleh Koordinator Program Studi.";

/// Canonical list of curricula used by the study program.
pub const KURIKULUM_ANSWER: &str = "\
Program Studi Sistem Informasi Undiksha menggunakan empat jenis kurikulum:
1. Kurikulum Undiksha 2024
2. Kurikulum MBKM Undiksha 2020
3. Kurikulum Undiksha 2019
4. Kurikulum KKNI 2016";

/// Canonical procedure for requesting academic leave.
pub const CUTI_ANSWER: &str = "\
Untuk mengurus surat permohonan cuti akademik, prosedurnya adalah sebagai berikut:
1. Mahasiswa mengunduh formulir permohonan cuti akademik di laman akademik Undiksha.
2. Mengisi formulir dan melampirkan fotokopi kartu tanda mahasiswa.
3. Meminta persetujuan dosen pembimbing akademik.
4. Meminta persetujuan Koordinator Program Studi.
5. Meminta persetujuan Dekan Fakultas Teknik dan Kejuruan.
6. Menyerahkan berkas ke bagian akademik fakultas untuk diverifikasi.
7. Berkas diteruskan ke Biro Akademik Undiksha untuk penerbitan surat keputusan cuti.
8. Mahasiswa menerima surat keputusan cuti akademik dan menyimpannya sebagai arsip.";

/// Canonical question families, checked in declaration order.
pub const CANONICAL_ANSWERS: &[CanonicalEntry] = &[
    CanonicalEntry {
        patterns: &[
            r"pengajuan\s+(judul|topik)",
            r"(judul|topik)\s+(atau\s+topik\s+)?skripsi",
            r"prosedur\s+.*\bskripsi\b",
        ],
        answer: SKRIPSI_ANSWER,
    },
    CanonicalEntry {
        patterns: &[
            r"jenis\s+kurikulum",
            r"kurikulum\s+apa\s+saja",
            r"macam\s+.*kurikulum",
        ],
        answer: KURIKULUM_ANSWER,
    },
    CanonicalEntry {
        patterns: &[r"cuti\s+akademik"],
        answer: CUTI_ANSWER,
    },
];

/// Lecturer bios, keyed by a lowercase name substring.
///
/// A question containing any key (case-insensitively) is answered with the
/// mapped bio block verbatim.
pub const LECTURERS: &[(&str, &str)] = &[
    (
        "edy listartha",
        "I Made Edy Listartha, S.Kom., M.Kom. adalah dosen pada Program Studi Sistem Informasi \
         Undiksha. Bidang keahlian beliau meliputi jaringan komputer dan keamanan informasi. \
         Beliau mengampu mata kuliah Jaringan Komputer, Keamanan Informasi, dan Administrasi \
         Sistem.",
    ),
    (
        "ardwi pradnyana",
        "I Made Ardwi Pradnyana, S.T., M.T. adalah dosen pada Program Studi Sistem Informasi \
         Undiksha. Bidang keahlian beliau meliputi tata kelola teknologi informasi dan analisis \
         proses bisnis. Beliau mengampu mata kuliah Tata Kelola TI dan Analisis Proses Bisnis.",
    ),
    (
        "mahendra darmawiguna",
        "I Gede Mahendra Darmawiguna, S.Kom., M.Sc. adalah dosen pada Program Studi Sistem \
         Informasi Undiksha. Bidang keahlian beliau meliputi rekayasa perangkat lunak dan \
         multimedia pembelajaran. Beliau mengampu mata kuliah Rekayasa Perangkat Lunak dan \
         Interaksi Manusia dan Komputer.",
    ),
];
